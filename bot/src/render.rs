//! Conversions from platform-neutral views to serenity builders.

use passage_core::controls::{Control, ControlStyle, FlowView, validate_control};
use passage_core::message::{RenderedEmbed, RenderedMessage};
use passage_core::record::{RECORD_COLOUR, TicketRecord, validation_prompt};
use serenity::all::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter, CreateMessage,
    EditMessage,
};

const BUTTONS_PER_ROW: usize = 5;

pub fn button_style(style: ControlStyle) -> ButtonStyle {
    match style {
        ControlStyle::Primary => ButtonStyle::Primary,
        ControlStyle::Secondary => ButtonStyle::Secondary,
        ControlStyle::Success => ButtonStyle::Success,
        ControlStyle::Danger => ButtonStyle::Danger,
    }
}

pub fn button(control: &Control) -> CreateButton {
    CreateButton::new(control.id.clone())
        .label(control.label.clone())
        .style(button_style(control.style))
        .disabled(control.disabled)
}

/// Lay controls out in action rows, wrapping rows that exceed the platform limit.
pub fn action_rows(rows: &[Vec<Control>]) -> Vec<CreateActionRow> {
    rows.iter()
        .flat_map(|row| row.chunks(BUTTONS_PER_ROW))
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| CreateActionRow::Buttons(chunk.iter().map(button).collect()))
        .collect()
}

pub fn embed(embed: &RenderedEmbed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(title) = &embed.title {
        builder = builder.title(title.clone());
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description.clone());
    }
    if let Some(colour) = embed.colour {
        builder = builder.colour(colour);
    }
    for field in &embed.fields {
        builder = builder.field(field.name.clone(), field.value.clone(), field.inline);
    }
    if let Some(footer) = &embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(footer.clone()));
    }
    if let Some(url) = &embed.image_url {
        builder = builder.image(url.clone());
    }
    builder
}

pub fn flow_embed(view: &FlowView) -> CreateEmbed {
    CreateEmbed::new()
        .title(view.title.clone())
        .description(view.description.clone())
        .colour(RECORD_COLOUR)
}

pub fn create_message(message: &RenderedMessage) -> CreateMessage {
    let mut builder = CreateMessage::new();
    if let Some(content) = &message.content {
        builder = builder.content(content.clone());
    }
    if let Some(rendered) = &message.embed {
        builder = builder.embed(embed(rendered));
    }
    builder
}

/// Replace a message's embed in place, keeping its content.
/// The prompt carrying the single validation control of a ticket.
pub fn validation_message(record: &TicketRecord) -> CreateMessage {
    CreateMessage::new()
        .content(validation_prompt(record))
        .components(vec![CreateActionRow::Buttons(vec![button(&validate_control())])])
}

pub fn edit_embed(rendered: &RenderedEmbed) -> EditMessage {
    EditMessage::new().embed(embed(rendered))
}
