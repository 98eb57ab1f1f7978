use passage_core::channel::{demand_notice, next_ticket_name, ticket_access};
use passage_core::flow::TicketDraft;
use passage_core::record::{TicketRecord, encode};
use passage_core::{ChannelRef, MemberId};
use serenity::all::{
    ChannelId, ChannelType, Context, CreateChannel, CreateMessage, EditChannel,
    GuildId, PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};
use tracing::{info, warn};

use crate::error::AppError;
use crate::render;
use crate::state::AppState;

fn member_permissions() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::READ_MESSAGE_HISTORY
        | Permissions::ATTACH_FILES
        | Permissions::EMBED_LINKS
        | Permissions::ADD_REACTIONS
}

pub(crate) fn member_overwrite(member: MemberId) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: member_permissions(),
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Member(UserId::new(member.get())),
    }
}

pub(crate) async fn is_guild_member(ctx: &Context, guild: GuildId, member: MemberId) -> bool {
    guild.member(ctx, UserId::new(member.get())).await.is_ok()
}

/// Create the private ticket channel for a confirmed draft and post its
/// record, the demands-channel notice and the validation prompt.
pub async fn provision(
    ctx: &Context,
    state: &AppState,
    draft: &TicketDraft,
) -> Result<ChannelId, AppError> {
    let config = &state.config;
    let guild = config.guild();
    let bot = state.bot_id()?;
    let assignee = state.resolver.provider_for(&draft.activity);
    let record = TicketRecord::from_draft(draft, assignee);

    let mut overwrites = vec![PermissionOverwrite {
        allow: Permissions::empty(),
        deny: Permissions::VIEW_CHANNEL,
        kind: PermissionOverwriteType::Role(RoleId::new(guild.get())),
    }];
    for member in ticket_access(bot, record.requester, assignee, config.owner_id) {
        if member == bot || member == record.requester || is_guild_member(ctx, guild, member).await {
            overwrites.push(member_overwrite(member));
        } else {
            warn!(member = %member, "identity is not in the guild; skipping channel access");
        }
    }

    let name = next_name(ctx, state, guild).await;
    let channel = guild
        .create_channel(
            &ctx.http,
            CreateChannel::new(name.clone())
                .kind(ChannelType::Text)
                .category(config.ticket_category())
                .permissions(overwrites),
        )
        .await?;

    if let Err(err) = channel
        .id
        .edit(&ctx.http, EditChannel::new().topic(record.availability_text.clone()))
        .await
    {
        warn!(channel = %channel.id, error = %err, "could not set ticket topic");
    }

    channel
        .id
        .send_message(&ctx.http, render::create_message(&encode(&record)))
        .await?;

    let notice = demand_notice(&record, ChannelRef(channel.id.get()));
    if let Err(err) = config
        .demands_channel()
        .send_message(&ctx.http, CreateMessage::new().content(notice))
        .await
    {
        warn!(error = %err, "could not announce ticket in demands channel");
    }

    channel
        .id
        .send_message(&ctx.http, render::validation_message(&record))
        .await?;

    if is_guild_member(ctx, guild, assignee).await {
        if let Err(err) = config
            .screen_channel()
            .create_permission(&ctx.http, member_overwrite(assignee))
            .await
        {
            warn!(assignee = %assignee, error = %err, "could not open screenshot channel");
        }
    }

    info!(
        channel = %channel.id,
        name = %name,
        requester = %record.requester,
        assignee = %assignee,
        activity = %record.activity,
        "ticket provisioned"
    );
    Ok(channel.id)
}

/// Numbered name from the channels already in the ticket category. Falls back
/// to the first number when the guild's channels cannot be listed.
async fn next_name(ctx: &Context, state: &AppState, guild: GuildId) -> String {
    let prefix = state.config.ticket_prefix.as_str();
    match guild.channels(&ctx.http).await {
        Ok(channels) => {
            let category = state.config.ticket_category();
            next_ticket_name(
                channels
                    .values()
                    .filter(|c| c.parent_id == Some(category))
                    .map(|c| c.name.as_str()),
                prefix,
            )
        }
        Err(err) => {
            warn!(error = %err, "could not list guild channels for ticket numbering");
            next_ticket_name(std::iter::empty(), prefix)
        }
    }
}
