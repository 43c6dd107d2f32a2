//! The action union and its validator.
//!
//! An external reasoning service answers with free text that is supposed to
//! be one JSON object:
//!
//! ```json
//! { "action": "BUY_ITEM", "details": { "item_id": "item_001" } }
//! ```
//!
//! [`Action`] is the typed form of that object. Serde goes through a private
//! wire struct marked `deny_unknown_fields`, and the `TryFrom` conversion
//! enforces the per-kind required field, so every `Action` value in the
//! program is well-formed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

/// The four action kinds, as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Attack,
    BuyItem,
    DrinkPotion,
    Rest,
}

impl ActionKind {
    /// The closed vocabulary advertised to external agents.
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Attack,
        ActionKind::BuyItem,
        ActionKind::DrinkPotion,
        ActionKind::Rest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attack => "ATTACK",
            Self::BuyItem => "BUY_ITEM",
            Self::DrinkPotion => "DRINK_POTION",
            Self::Rest => "REST",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireAction", into = "WireAction")]
pub enum Action {
    Attack,
    BuyItem { item_id: String },
    DrinkPotion { potion_id: String },
    Rest,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Attack => ActionKind::Attack,
            Self::BuyItem { .. } => ActionKind::BuyItem,
            Self::DrinkPotion { .. } => ActionKind::DrinkPotion,
            Self::Rest => ActionKind::Rest,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireAction {
    action: ActionKind,
    details: WireDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    potion_id: Option<String>,
}

impl TryFrom<WireAction> for Action {
    type Error = ProtocolError;

    fn try_from(wire: WireAction) -> Result<Self, Self::Error> {
        let required = |field: Option<String>, name: &str| {
            field
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| {
                    ProtocolError::InvalidAction(format!(
                        "{} requires details.{name}",
                        wire.action
                    ))
                })
        };

        match wire.action {
            ActionKind::Attack => Ok(Self::Attack),
            ActionKind::Rest => Ok(Self::Rest),
            ActionKind::BuyItem => Ok(Self::BuyItem {
                item_id: required(wire.details.item_id, "item_id")?,
            }),
            ActionKind::DrinkPotion => Ok(Self::DrinkPotion {
                potion_id: required(wire.details.potion_id, "potion_id")?,
            }),
        }
    }
}

impl From<Action> for WireAction {
    fn from(action: Action) -> Self {
        let kind = action.kind();
        let details = match action {
            Action::BuyItem { item_id } => WireDetails {
                item_id: Some(item_id),
                potion_id: None,
            },
            Action::DrinkPotion { potion_id } => WireDetails {
                item_id: None,
                potion_id: Some(potion_id),
            },
            Action::Attack | Action::Rest => WireDetails::default(),
        };
        Self {
            action: kind,
            details,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation entry points
// ---------------------------------------------------------------------------

/// Parses raw text from an external agent into an [`Action`].
///
/// Accepts a bare JSON object, a JSON string that contains one (unwrapped
/// once), or prose/code fences around a single object.
pub fn parse_action(text: &str) -> Result<Action, ProtocolError> {
    validate_action(parse_json_text(text)?)
}

/// Validates an already-parsed JSON value into an [`Action`].
pub fn validate_action(value: Value) -> Result<Action, ProtocolError> {
    match value {
        Value::String(text) => action_from_value(parse_json_text(&text)?),
        other => action_from_value(other),
    }
}

fn action_from_value(value: Value) -> Result<Action, ProtocolError> {
    if !value.is_object() {
        return Err(ProtocolError::InvalidAction(format!(
            "expected a JSON object, got {value}"
        )));
    }
    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidAction(e.to_string()))
}

fn parse_json_text(text: &str) -> Result<Value, ProtocolError> {
    let text = text.trim();
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    let span = outermost_object(text)
        .ok_or_else(|| ProtocolError::InvalidAction("response contains no JSON object".into()))?;
    serde_json::from_str(span).map_err(|e| ProtocolError::InvalidAction(e.to_string()))
}

/// The span from the first `{` to the last `}`, if any.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
