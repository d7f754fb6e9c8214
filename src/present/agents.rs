use std::cmp::Ordering;
use std::fmt;

use deunicode::deunicode;

use crate::genesys::models::{User, UsersResponse};

use super::StatusColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Available,
    Away,
    Busy,
    OnQueue,
    Unknown,
}

impl Presence {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("AVAILABLE") => Self::Available,
            Some("AWAY") => Self::Away,
            Some("BUSY") => Self::Busy,
            Some("ON_QUEUE") => Self::OnQueue,
            _ => Self::Unknown,
        }
    }

    pub fn color(self) -> StatusColor {
        match self {
            Self::Available => StatusColor::Green,
            Self::Away => StatusColor::Orange,
            Self::Busy => StatusColor::Red,
            Self::OnQueue => StatusColor::Blue,
            Self::Unknown => StatusColor::Gray,
        }
    }

    pub fn icon(self) -> StatusIcon {
        match self {
            Self::Available => StatusIcon::CheckCircle,
            Self::Away => StatusIcon::Clock,
            Self::Busy => StatusIcon::TimesCircle,
            Self::OnQueue => StatusIcon::PhoneVolume,
            Self::Unknown => StatusIcon::QuestionCircle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    CheckCircle,
    Clock,
    TimesCircle,
    PhoneVolume,
    QuestionCircle,
}

impl StatusIcon {
    pub fn name(self) -> &'static str {
        match self {
            Self::CheckCircle => "check-circle",
            Self::Clock => "clock",
            Self::TimesCircle => "times-circle",
            Self::PhoneVolume => "phone-volume",
            Self::QuestionCircle => "question-circle",
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Self::CheckCircle => '\u{2714}',
            Self::Clock => '\u{25f7}',
            Self::TimesCircle => '\u{2716}',
            Self::PhoneVolume => '\u{260e}',
            Self::QuestionCircle => '?',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRow {
    pub name: String,
    pub presence: Presence,
    pub color: StatusColor,
    pub icon: StatusIcon,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentView {
    /// No agents online (absent or empty entity list).
    Empty,
    Agents(Vec<AgentRow>),
}

impl AgentView {
    pub fn rows(&self) -> &[AgentRow] {
        match self {
            Self::Empty => &[],
            Self::Agents(rows) => rows,
        }
    }

    pub fn available_count(&self) -> usize {
        self.rows()
            .iter()
            .filter(|r| r.presence == Presence::Available)
            .count()
    }
}

impl fmt::Display for AgentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => writeln!(f, "  No agents currently online"),
            Self::Agents(rows) => {
                for row in rows {
                    writeln!(
                        f,
                        "  {} {:<32} {:<16} ({})",
                        row.icon.glyph(),
                        row.name,
                        row.label,
                        row.color.name()
                    )?;
                }
                Ok(())
            }
        }
    }
}

fn system_presence(user: &User) -> Option<&str> {
    user.presence_definition()
        .and_then(|d| d.system_presence.as_deref())
}

fn label_for(user: &User, presence: Presence) -> String {
    if presence == Presence::Unknown {
        return "Unknown".to_string();
    }
    let def = user.presence_definition();
    def.and_then(|d| d.language_labels.as_ref())
        .and_then(|l| l.en_us.as_deref())
        .filter(|l| !l.is_empty())
        .or_else(|| def.and_then(|d| d.system_presence.as_deref()))
        .unwrap_or("Unknown")
        .to_string()
}

/// Sort key for one agent. Names compare by their accent-folded lowercase
/// form first, so "Émile" sits next to "Emile" rather than after "Zoe".
struct SortKey {
    available: bool,
    folded: String,
    lower: String,
}

impl SortKey {
    fn new(presence: Presence, name: &str) -> Self {
        Self {
            available: presence == Presence::Available,
            folded: deunicode(name).to_lowercase(),
            lower: name.to_lowercase(),
        }
    }
}

/// Available first, then collated name order. Used with a stable sort, so
/// equal keys keep their payload order.
fn compare(a: &SortKey, b: &SortKey) -> Ordering {
    b.available
        .cmp(&a.available)
        .then_with(|| a.folded.cmp(&b.folded))
        .then_with(|| a.lower.cmp(&b.lower))
}

pub fn present_agents(payload: &UsersResponse) -> AgentView {
    let entities = match payload.entities.as_deref() {
        Some(e) if !e.is_empty() => e,
        _ => return AgentView::Empty,
    };

    let mut keyed: Vec<(SortKey, Presence, String, &User)> = entities
        .iter()
        .map(|u| {
            let presence = Presence::from_code(system_presence(u));
            let name = u.name.clone().unwrap_or_default();
            (SortKey::new(presence, &name), presence, name, u)
        })
        .collect();
    keyed.sort_by(|a, b| compare(&a.0, &b.0));

    let rows = keyed
        .into_iter()
        .map(|(_, presence, name, user)| AgentRow {
            label: label_for(user, presence),
            name,
            presence,
            color: presence.color(),
            icon: presence.icon(),
        })
        .collect();

    AgentView::Agents(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> UsersResponse {
        serde_json::from_str(json).unwrap()
    }

    fn names(view: &AgentView) -> Vec<&str> {
        view.rows().iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_available_sorts_first() {
        let view = present_agents(&payload(
            r#"{"entities":[
                {"name":"Bob","presence":{"presenceDefinition":{"systemPresence":"AWAY"}}},
                {"name":"Amy","presence":{"presenceDefinition":{"systemPresence":"AVAILABLE"}}}
            ]}"#,
        ));
        let rows = view.rows();
        assert_eq!(names(&view), ["Amy", "Bob"]);
        assert_eq!(rows[0].color, StatusColor::Green);
        assert_eq!(rows[0].label, "AVAILABLE");
        assert_eq!(rows[1].color, StatusColor::Orange);
        assert_eq!(rows[1].icon, StatusIcon::Clock);
    }

    #[test]
    fn test_names_compare_case_insensitively_within_status() {
        let view = present_agents(&payload(
            r#"{"entities":[
                {"name":"zed","presence":{"presenceDefinition":{"systemPresence":"BUSY"}}},
                {"name":"Carl","presence":{"presenceDefinition":{"systemPresence":"AVAILABLE"}}},
                {"name":"alice","presence":{"presenceDefinition":{"systemPresence":"ON_QUEUE"}}},
                {"name":"beth","presence":{"presenceDefinition":{"systemPresence":"AVAILABLE"}}},
                {"name":"Bill"}
            ]}"#,
        ));
        assert_eq!(names(&view), ["beth", "Carl", "alice", "Bill", "zed"]);
        assert_eq!(view.available_count(), 2);
    }

    #[test]
    fn test_accented_names_collate_with_their_base_letter() {
        let view = present_agents(&payload(
            r#"{"entities":[
                {"name":"Zoe","presence":{"presenceDefinition":{"systemPresence":"AWAY"}}},
                {"name":"Émile","presence":{"presenceDefinition":{"systemPresence":"AWAY"}}},
                {"name":"emma","presence":{"presenceDefinition":{"systemPresence":"AWAY"}}},
                {"name":"Björn","presence":{"presenceDefinition":{"systemPresence":"AWAY"}}}
            ]}"#,
        ));
        assert_eq!(names(&view), ["Björn", "Émile", "emma", "Zoe"]);
    }

    #[test]
    fn test_equal_names_keep_payload_order() {
        let view = present_agents(&payload(
            r#"{"entities":[
                {"name":"sam","presence":{"presenceDefinition":{"systemPresence":"BUSY"}}},
                {"name":"Sam","presence":{"presenceDefinition":{"systemPresence":"AWAY"}}}
            ]}"#,
        ));
        let rows = view.rows();
        assert_eq!(rows[0].presence, Presence::Busy);
        assert_eq!(rows[1].presence, Presence::Away);
    }

    #[test]
    fn test_style_table() {
        let view = present_agents(&payload(
            r#"{"entities":[
                {"name":"a","presence":{"presenceDefinition":{"systemPresence":"BUSY","languageLabels":{"en_US":"Busy"}}}},
                {"name":"b","presence":{"presenceDefinition":{"systemPresence":"ON_QUEUE","languageLabels":{"en_US":"On Queue"}}}},
                {"name":"c","presence":{"presenceDefinition":{"systemPresence":"MEAL","languageLabels":{"en_US":"Meal"}}}},
                {"name":"d"}
            ]}"#,
        ));
        let styled: Vec<(StatusColor, &str, &str)> = view
            .rows()
            .iter()
            .map(|r| (r.color, r.icon.name(), r.label.as_str()))
            .collect();
        assert_eq!(
            styled,
            [
                (StatusColor::Red, "times-circle", "Busy"),
                (StatusColor::Blue, "phone-volume", "On Queue"),
                (StatusColor::Gray, "question-circle", "Unknown"),
                (StatusColor::Gray, "question-circle", "Unknown"),
            ]
        );
    }

    #[test]
    fn test_empty_and_absent_entities() {
        assert_eq!(present_agents(&payload("{}")), AgentView::Empty);
        assert_eq!(
            present_agents(&payload(r#"{"entities":[]}"#)),
            AgentView::Empty
        );
        assert!(AgentView::Empty.to_string().contains("No agents currently online"));
    }
}
