//! Service facade: checks arguments against the registry, then dispatches

use crate::action::{Action, validate_action};
use crate::client::DfpClient;
use crate::error::{DfpError, Result};
use crate::registry::{OperationSpec, ParamKind, ReturnShape, ServiceSpec, service_spec};
use crate::statement::{Statement, validate_statement};
use dfpsoap::{WireStruct, WireValue};
use tracing::{debug, warn};

/// One service of a client's API version
pub struct DfpService<'a> {
    client: &'a DfpClient,
    spec: &'static ServiceSpec,
}

impl<'a> DfpService<'a> {
    /// Fails when the service does not exist in the client's version.
    pub fn new(client: &'a DfpClient, name: &str) -> Result<Self> {
        let spec = service_spec(name, client.version()).ok_or_else(|| {
            DfpError::Validation(format!(
                "{name} is not available in {}",
                client.version()
            ))
        })?;
        Ok(Self { client, spec })
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn spec(&self) -> &'static ServiceSpec {
        self.spec
    }

    /// Calls `operation` with named arguments.
    ///
    /// Arguments are checked before anything is sent: statements and
    /// actions are validated, missing parameters rejected, and in strict
    /// mode undeclared ones too.
    pub fn call(&self, operation: &str, args: WireStruct) -> Result<(WireValue,)> {
        let op = self.spec.operation(operation).ok_or_else(|| {
            DfpError::Validation(format!("{} has no operation {operation}", self.spec.name))
        })?;

        let params = self.prepare_params(op, args)?;
        debug!(service = self.spec.name, operation, "Dispatching");

        let (rval,) = self.client.call_method(self.spec.name, op.name, &params)?;
        Ok((shape_result(rval, op.returns),))
    }

    /// Runs the service's `get*ByStatement` operation.
    pub fn get_by_statement(&self, statement: Statement) -> Result<WireValue> {
        let op = self
            .spec
            .operations
            .iter()
            .find(|op| op.name.starts_with("get") && op.name.ends_with("ByStatement"))
            .ok_or_else(|| {
                DfpError::Validation(format!("{} has no ByStatement query", self.spec.name))
            })?;
        let args = WireStruct::new().with("filterStatement", statement);
        self.call(op.name, args).map(|(page,)| page)
    }

    /// Runs the service's `perform*Action` operation.
    pub fn perform_action(&self, action: Action, statement: Statement) -> Result<WireValue> {
        let op = self
            .spec
            .operations
            .iter()
            .find(|op| op.name.starts_with("perform") && op.name.ends_with("Action"))
            .ok_or_else(|| DfpError::Validation(format!("{} has no actions", self.spec.name)))?;
        let args = action_args(op, action, statement)?;
        self.call(op.name, args).map(|(result,)| result)
    }

    fn prepare_params(
        &self,
        op: &OperationSpec,
        mut args: WireStruct,
    ) -> Result<Vec<(String, WireValue)>> {
        let mut params = Vec::with_capacity(op.params.len());

        for spec in op.params {
            let value = args.remove(spec.name).ok_or_else(|| {
                DfpError::Validation(format!("{} requires {}", op.name, spec.name))
            })?;
            let value = check_param(op.name, spec.name, spec.kind, value)?;
            params.push((spec.name.to_string(), value));
        }

        if !args.is_empty() {
            let extra: Vec<&str> = args.iter().map(|(k, _)| k.as_str()).collect();
            if self.client.config().strict {
                return Err(DfpError::Validation(format!(
                    "{} does not take {}",
                    op.name,
                    extra.join(", ")
                )));
            }
            warn!(operation = op.name, "Passing undeclared parameters: {}", extra.join(", "));
            params.extend(args.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Ok(params)
    }
}

fn check_param(operation: &str, name: &str, kind: ParamKind, value: WireValue) -> Result<WireValue> {
    let wrong = |expected: &str| {
        DfpError::Validation(format!("{operation}: {name} must be {expected}"))
    };

    match kind {
        ParamKind::Statement => Ok(validate_statement(&value)?.into()),
        ParamKind::Action(entity) => {
            let action = validate_action(&value)?;
            if action.entity() != entity {
                return Err(DfpError::Validation(format!(
                    "{operation}: {} applies to {}, not {entity}",
                    action.kind,
                    action.entity()
                )));
            }
            Ok(action.into())
        }
        ParamKind::Entity => match value {
            WireValue::Struct(_) => Ok(value),
            _ => Err(wrong("an entity")),
        },
        ParamKind::EntityList => {
            let items = value.into_seq();
            if items.iter().all(|item| matches!(item, WireValue::Struct(_))) {
                Ok(WireValue::Seq(items))
            } else {
                Err(wrong("a list of entities"))
            }
        }
        ParamKind::Scalar => match value {
            WireValue::Scalar(_) => Ok(value),
            _ => Err(wrong("a scalar")),
        },
    }
}

fn shape_result(rval: WireValue, shape: ReturnShape) -> WireValue {
    match shape {
        ReturnShape::Nothing => WireValue::Nil,
        ReturnShape::Single => rval,
        ReturnShape::Collection => WireValue::Seq(rval.into_seq()),
        ReturnShape::Page => match rval {
            WireValue::Struct(mut page) => {
                if !page.contains_key("results") {
                    page.insert("results", WireValue::Seq(Vec::new()));
                }
                WireValue::Struct(page)
            }
            other => other,
        },
    }
}

/// The action goes under the operation's first parameter.
fn action_args(op: &OperationSpec, action: Action, statement: Statement) -> Result<WireStruct> {
    let param = op
        .params
        .first()
        .ok_or_else(|| DfpError::Validation(format!("{} takes no action", op.name)))?;
    Ok(WireStruct::new()
        .with(param.name, action)
        .with("filterStatement", statement))
}
