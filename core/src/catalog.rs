use serde::Serialize;

/// Rendered when no achievement was picked.
pub const NO_OPTIONS_LABEL: &str = "Aucun";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementOption {
    pub label: &'static str,
    pub code: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Activity {
    pub name: &'static str,
    pub options: &'static [AchievementOption],
    /// Codes shown in the flow but never selectable.
    pub disabled: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Zone {
    pub name: &'static str,
    /// Short stable key used in control identifiers.
    pub slug: &'static str,
    pub activities: &'static [Activity],
}

const fn opt(label: &'static str, code: &'static str) -> AchievementOption {
    AchievementOption { label, code }
}

static ZONES: &[Zone] = &[
    Zone {
        name: "Frigost 2",
        slug: "f2",
        activities: &[
            Activity {
                name: "Obsidiantre",
                options: &[
                    opt("Premier", "obsi_premier"),
                    opt("Statue", "obsi_statue"),
                    opt("Duo", "obsi_duo"),
                ],
                disabled: &[],
            },
            Activity {
                name: "Tengu",
                options: &[
                    opt("Premier", "tengu_premier"),
                    opt("Statue", "tengu_statue"),
                    opt("Duo", "tengu_duo"),
                ],
                disabled: &[],
            },
            Activity {
                name: "Korriandre",
                options: &[
                    opt("Mystique", "korriandre_mystique"),
                    opt("Zombie", "korriandre_zombie"),
                    opt("Duo", "korriandre_duo"),
                ],
                disabled: &[],
            },
            Activity {
                name: "Kolosso",
                options: &[
                    opt("Dernier", "kolosso_dernier"),
                    opt("Premier", "kolosso_premier"),
                    opt("Duo", "kolosso_duo"),
                ],
                disabled: &[],
            },
            Activity {
                name: "Glours",
                options: &[
                    opt("Premier", "glours_premier"),
                    opt("Collant", "glours_collant"),
                    opt("Duo", "glours_duo"),
                ],
                disabled: &["glours_collant"],
            },
            Activity {
                name: "Sakaii",
                options: &[
                    opt("Versatile", "sakaii_versatile"),
                    opt("Blitzkrieg", "sakaii_blitzkrieg"),
                    opt("Duo", "sakaii_duo"),
                ],
                disabled: &["sakaii_blitzkrieg"],
            },
        ],
    },
    Zone {
        name: "Pandala",
        slug: "pandala",
        activities: &[
            Activity {
                name: "Nagate",
                options: &[
                    opt("Dernier", "nagate_dernier"),
                    opt("Hardi", "nagate_hardi"),
                    opt("Duo", "nagate_duo"),
                ],
                disabled: &[],
            },
            Activity {
                name: "Tanu",
                options: &[
                    opt("Nomade", "tanu_nomade"),
                    opt("Blitzkrieg", "tanu_blitz"),
                    opt("Duo", "tanu_duo"),
                ],
                disabled: &["tanu_blitz"],
            },
            Activity {
                name: "Founo",
                options: &[
                    opt("Dernier", "founo_dernier"),
                    opt("Anachorète", "founo_anachorete"),
                    opt("Duo", "founo_duo"),
                ],
                disabled: &[],
            },
            Activity {
                name: "Dojo du vent",
                options: &[
                    opt("Premier", "dojo_premier"),
                    opt("Pusillanime", "dojo_pusillanime"),
                    opt("Duo", "dojo_duo"),
                ],
                disabled: &["dojo_premier", "dojo_duo"],
            },
            Activity {
                name: "Damadrya",
                options: &[
                    opt("Anachorète", "damadrya_anachorete"),
                    opt("Premier", "damadrya_premier"),
                    opt("Duo", "damadrya_duo"),
                ],
                disabled: &[],
            },
            Activity {
                name: "Katamashii",
                options: &[
                    opt("Main propres", "katamashii_main"),
                    opt("Hardi", "katamashii_hardi"),
                    opt("Duo", "katamashii_duo"),
                ],
                disabled: &["katamashii_hardi", "katamashii_duo"],
            },
        ],
    },
    Zone {
        name: "Otomaii",
        slug: "otoma",
        activities: &[
            Activity {
                name: "Kralamour",
                options: &[
                    opt("Nomade", "kralamour_nomade"),
                    opt("Blitzkrieg", "kralamour_blitzkrieg"),
                    opt("Duo", "kralamour_duo"),
                ],
                disabled: &[],
            },
            Activity {
                name: "Kimbo",
                options: &[
                    opt("Statue", "kimbo_statue"),
                    opt("Premier", "kimbo_premier"),
                    opt("Duo", "kimbo_duo"),
                ],
                disabled: &[],
            },
        ],
    },
];

/// Static zone → activity → achievement table. Lookups never fail: unknown
/// keys resolve to empty results.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    zones: &'static [Zone],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub const fn builtin() -> Self {
        Self { zones: ZONES }
    }

    pub fn zones(&self) -> &'static [Zone] {
        self.zones
    }

    pub fn zone(&self, name: &str) -> Option<&'static Zone> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn zone_by_slug(&self, slug: &str) -> Option<&'static Zone> {
        self.zones.iter().find(|z| z.slug == slug)
    }

    pub fn activity(&self, name: &str) -> Option<&'static Activity> {
        self.zones
            .iter()
            .flat_map(|z| z.activities.iter())
            .find(|a| a.name == name)
    }

    pub fn contains(&self, activity: &str) -> bool {
        self.activity(activity).is_some()
    }

    pub fn zone_of(&self, activity: &str) -> Option<&'static Zone> {
        self.zones
            .iter()
            .find(|z| z.activities.iter().any(|a| a.name == activity))
    }

    /// Achievement options for `activity`, in configured order.
    pub fn options_for(&self, activity: &str) -> &'static [AchievementOption] {
        self.activity(activity).map(|a| a.options).unwrap_or(&[])
    }

    pub fn option(&self, activity: &str, code: &str) -> Option<&'static AchievementOption> {
        self.options_for(activity).iter().find(|o| o.code == code)
    }

    pub fn is_disabled(&self, activity: &str, code: &str) -> bool {
        self.activity(activity)
            .is_some_and(|a| a.disabled.contains(&code))
    }

    /// True when `code` belongs to `activity` and is not disabled.
    pub fn is_selectable(&self, activity: &str, code: &str) -> bool {
        self.option(activity, code).is_some() && !self.is_disabled(activity, code)
    }

    /// Comma-joined display labels for `codes`, in catalog order. Unknown codes
    /// are skipped; an empty result renders as [`NO_OPTIONS_LABEL`].
    pub fn labels_for<'a, I>(&self, activity: &str, codes: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let codes: Vec<&str> = codes.into_iter().collect();
        let labels: Vec<&str> = self
            .options_for(activity)
            .iter()
            .filter(|o| codes.contains(&o.code))
            .map(|o| o.label)
            .collect();
        if labels.is_empty() {
            NO_OPTIONS_LABEL.to_string()
        } else {
            labels.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_keep_configured_order() {
        let catalog = Catalog::builtin();
        let codes: Vec<&str> = catalog.options_for("Tengu").iter().map(|o| o.code).collect();
        assert_eq!(codes, vec!["tengu_premier", "tengu_statue", "tengu_duo"]);
    }

    #[test]
    fn disabled_codes_are_subset_of_options() {
        let catalog = Catalog::builtin();
        for zone in catalog.zones() {
            for activity in zone.activities {
                assert!(!activity.options.is_empty(), "{} has no options", activity.name);
                for code in activity.disabled {
                    assert!(
                        catalog.option(activity.name, code).is_some(),
                        "{code} is disabled but not offered by {}",
                        activity.name
                    );
                }
            }
        }
    }

    #[test]
    fn unknown_keys_resolve_to_empty() {
        let catalog = Catalog::builtin();
        assert!(catalog.options_for("Nowhere").is_empty());
        assert!(!catalog.is_disabled("Nowhere", "tanu_blitz"));
        assert!(!catalog.is_disabled("Tanu", "nope"));
        assert!(catalog.zone_of("Nowhere").is_none());
    }

    #[test]
    fn disabled_overlay_is_applied() {
        let catalog = Catalog::builtin();
        assert!(catalog.is_disabled("Tanu", "tanu_blitz"));
        assert!(!catalog.is_selectable("Tanu", "tanu_blitz"));
        assert!(catalog.is_selectable("Tanu", "tanu_duo"));
    }

    #[test]
    fn labels_render_in_catalog_order() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.labels_for("Tengu", ["tengu_duo", "tengu_premier"]),
            "Premier, Duo"
        );
        assert_eq!(catalog.labels_for("Tengu", []), NO_OPTIONS_LABEL);
    }

    #[test]
    fn zones_map_back_from_activities() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.zone_of("Kimbo").map(|z| z.name), Some("Otomaii"));
        assert_eq!(catalog.zone_by_slug("pandala").map(|z| z.activities.len()), Some(6));
    }
}
