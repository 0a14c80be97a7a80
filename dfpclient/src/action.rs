//! Bulk actions applied through `perform*Action`

use crate::error::{DfpError, Result};
use dfpsoap::{WireStruct, WireValue};
use std::fmt;
use std::str::FromStr;

macro_rules! action_kinds {
    (@skip skip_inventory_check) => { true };
    (@skip) => { false };
    ($($variant:ident => $entity:literal $(, $skip:ident)?;)*) => {
        /// Bulk action, by wire type name
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ActionKind {
            $($variant,)*
        }

        impl ActionKind {
            pub const ALL: &'static [ActionKind] = &[$(ActionKind::$variant,)*];

            /// Wire type name (`ApproveOrders`).
            pub fn as_str(self) -> &'static str {
                match self {
                    $(ActionKind::$variant => stringify!($variant),)*
                }
            }

            /// Entity the action applies to (`Order`).
            pub fn entity(self) -> &'static str {
                match self {
                    $(ActionKind::$variant => $entity,)*
                }
            }

            /// True when the action accepts `skipInventoryCheck`.
            pub fn accepts_skip_inventory_check(self) -> bool {
                match self {
                    $(ActionKind::$variant => action_kinds!(@skip $($skip)?),)*
                }
            }
        }
    };
}

action_kinds! {
    ActivateAdUnits => "AdUnit";
    ArchiveAdUnits => "AdUnit";
    DeactivateAdUnits => "AdUnit";
    ActivateLabels => "Label";
    DeactivateLabels => "Label";
    ActivateLineItemCreativeAssociations => "LineItemCreativeAssociation";
    DeactivateLineItemCreativeAssociations => "LineItemCreativeAssociation";
    ActivateLineItems => "LineItem", skip_inventory_check;
    ArchiveLineItems => "LineItem";
    DeleteLineItems => "LineItem";
    PauseLineItems => "LineItem";
    ReleaseLineItems => "LineItem";
    ReserveLineItems => "LineItem", skip_inventory_check;
    ResumeLineItems => "LineItem", skip_inventory_check;
    ApproveOrders => "Order", skip_inventory_check;
    ApproveAndOverbookOrders => "Order", skip_inventory_check;
    ArchiveOrders => "Order";
    DeleteOrders => "Order";
    DisapproveOrders => "Order";
    PauseOrders => "Order";
    ResumeOrders => "Order", skip_inventory_check;
    RetractOrders => "Order";
    SubmitOrdersForApproval => "Order", skip_inventory_check;
    ActivatePlacements => "Placement";
    ArchivePlacements => "Placement";
    DeactivatePlacements => "Placement";
    ActivateUsers => "User";
    DeactivateUsers => "User";
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = DfpError;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DfpError::Validation(format!("unknown action {s:?}")))
    }
}

/// Action with its options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub skip_inventory_check: Option<bool>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            skip_inventory_check: None,
        }
    }

    pub fn skip_inventory_check(mut self, skip: bool) -> Result<Self> {
        if !self.kind.accepts_skip_inventory_check() {
            return Err(DfpError::Validation(format!(
                "{} does not accept skipInventoryCheck",
                self.kind
            )));
        }
        self.skip_inventory_check = Some(skip);
        Ok(self)
    }

    pub fn entity(&self) -> &'static str {
        self.kind.entity()
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Action::new(kind)
    }
}

impl From<Action> for WireValue {
    fn from(action: Action) -> Self {
        let mut s = WireStruct::typed(action.kind.as_str());
        if let Some(skip) = action.skip_inventory_check {
            s.insert("skipInventoryCheck", skip);
        }
        s.into()
    }
}

/// Checks a caller-supplied action and returns its typed form.
pub fn validate_action(value: &WireValue) -> Result<Action> {
    let s = value
        .as_struct()
        .ok_or_else(|| DfpError::Validation("action must be a struct".into()))?;
    let kind: ActionKind = s
        .xsi_type()
        .ok_or_else(|| DfpError::Validation("action must carry its type".into()))?
        .parse()?;

    let mut action = Action::new(kind);
    for (key, field) in s.iter() {
        match (key.as_str(), field.as_str()) {
            ("skipInventoryCheck", Some(flag @ ("true" | "false"))) => {
                action = action.skip_inventory_check(flag == "true")?;
            }
            ("skipInventoryCheck", _) => {
                return Err(DfpError::Validation(
                    "skipInventoryCheck must be true or false".into(),
                ));
            }
            (other, _) => {
                return Err(DfpError::Validation(format!("{kind} has no field {other:?}")));
            }
        }
    }
    Ok(action)
}
