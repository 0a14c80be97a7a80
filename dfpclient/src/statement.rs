//! PQL statements and their bind values

use crate::error::{DfpError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use dfpsoap::{WireStruct, WireValue};

/// Maximum number of bind values a statement may carry.
pub const MAX_STATEMENT_VALUES: usize = 1;

/// Typed bind value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    /// Numeric text, kept as sent.
    Number(String),
    Boolean(bool),
    Date(NaiveDate),
    DateTime {
        value: NaiveDateTime,
        time_zone_id: String,
    },
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    /// Number value; fails on non-numeric text.
    pub fn number(number: impl ToString) -> Result<Self> {
        let text = number.to_string();
        check_number(&text)?;
        Ok(Value::Number(text))
    }

    /// Wire subtype name.
    pub fn xsi_type(&self) -> &'static str {
        match self {
            Value::Text(_) => "TextValue",
            Value::Number(_) => "NumberValue",
            Value::Boolean(_) => "BooleanValue",
            Value::Date(_) => "DateValue",
            Value::DateTime { .. } => "DateTimeValue",
        }
    }
}

fn check_number(text: &str) -> Result<()> {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(()),
        _ => Err(DfpError::Validation(format!("{text:?} is not a number"))),
    }
}

fn date_struct(date: NaiveDate) -> WireStruct {
    WireStruct::new()
        .with("year", date.year())
        .with("month", date.month())
        .with("day", date.day())
}

fn int_field(s: &WireStruct, key: &str) -> Result<u32> {
    s.get_str(key)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| DfpError::Validation(format!("date field {key} is missing or not a number")))
}

fn parse_date(value: &WireValue) -> Result<NaiveDate> {
    let s = value
        .as_struct()
        .ok_or_else(|| DfpError::Validation("date must have year, month and day".into()))?;
    let year = s
        .get_str("year")
        .and_then(|y| y.trim().parse::<i32>().ok())
        .ok_or_else(|| DfpError::Validation("date field year is missing or not a number".into()))?;
    let (month, day) = (int_field(s, "month")?, int_field(s, "day")?);
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DfpError::Validation(format!("invalid date {year}-{month}-{day}")))
}

fn parse_date_time(value: &WireValue) -> Result<(NaiveDateTime, String)> {
    let s = value
        .as_struct()
        .ok_or_else(|| DfpError::Validation("dateTime must be a struct".into()))?;
    let date = parse_date(
        s.get("date")
            .ok_or_else(|| DfpError::Validation("dateTime.date is required".into()))?,
    )?;
    let time = NaiveTime::from_hms_opt(
        int_field(s, "hour")?,
        int_field(s, "minute")?,
        int_field(s, "second")?,
    )
    .ok_or_else(|| DfpError::Validation("invalid time of day".into()))?;
    let zone = s
        .get_str("timeZoneID")
        .filter(|z| !z.is_empty())
        .ok_or_else(|| DfpError::Validation("dateTime.timeZoneID is required".into()))?;
    Ok((date.and_time(time), zone.to_string()))
}

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        let typed = WireStruct::typed(value.xsi_type());
        let s = match value {
            Value::Text(text) => typed.with("value", text),
            Value::Number(text) => typed.with("value", text),
            Value::Boolean(b) => typed.with("value", b),
            Value::Date(date) => typed.with("value", date_struct(date)),
            Value::DateTime {
                value,
                time_zone_id,
            } => typed.with(
                "value",
                WireStruct::new()
                    .with("date", date_struct(value.date()))
                    .with("hour", value.hour())
                    .with("minute", value.minute())
                    .with("second", value.second())
                    .with("timeZoneID", time_zone_id),
            ),
        };
        s.into()
    }
}

impl TryFrom<&WireValue> for Value {
    type Error = DfpError;

    fn try_from(wire: &WireValue) -> Result<Self> {
        let s = wire
            .as_struct()
            .ok_or_else(|| DfpError::Validation("bind value must be a struct".into()))?;
        let xsi_type = s
            .xsi_type()
            .ok_or_else(|| DfpError::Validation("bind value must carry its type".into()))?;
        let inner = s
            .get("value")
            .ok_or_else(|| DfpError::Validation(format!("{xsi_type} has no value")))?;
        let text = || {
            inner
                .as_str()
                .ok_or_else(|| DfpError::Validation(format!("{xsi_type}.value must be text")))
        };

        match xsi_type {
            "TextValue" => Ok(Value::Text(text()?.to_string())),
            "NumberValue" => {
                let n = text()?;
                check_number(n)?;
                Ok(Value::Number(n.to_string()))
            }
            "BooleanValue" => match text()? {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                other => Err(DfpError::Validation(format!("{other:?} is not a boolean"))),
            },
            "DateValue" => Ok(Value::Date(parse_date(inner)?)),
            "DateTimeValue" => {
                let (value, time_zone_id) = parse_date_time(inner)?;
                Ok(Value::DateTime {
                    value,
                    time_zone_id,
                })
            }
            other => Err(DfpError::Validation(format!("unknown value type {other}"))),
        }
    }
}

/// Named bind value
#[derive(Debug, Clone, PartialEq)]
pub struct StatementValue {
    pub key: String,
    pub value: Value,
}

/// PQL query with its bind values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub query: String,
    pub values: Vec<StatementValue>,
}

impl Statement {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            values: Vec::new(),
        }
    }

    /// Binds `:key` in the query.
    pub fn bind(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.push(StatementValue {
            key: key.into(),
            value,
        });
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.values.len() > MAX_STATEMENT_VALUES {
            return Err(DfpError::Validation(format!(
                "a statement accepts at most {MAX_STATEMENT_VALUES} value, got {}",
                self.values.len()
            )));
        }
        if let Some(v) = self.values.iter().find(|v| v.key.is_empty()) {
            return Err(DfpError::Validation(format!(
                "{} bind value has an empty key",
                v.value.xsi_type()
            )));
        }
        Ok(())
    }
}

impl From<Statement> for WireValue {
    fn from(statement: Statement) -> Self {
        let values: Vec<WireValue> = statement
            .values
            .into_iter()
            .map(|v| WireStruct::new().with("key", v.key).with("value", v.value).into())
            .collect();
        let mut s = WireStruct::new().with("query", statement.query);
        if !values.is_empty() {
            s.insert("values", values);
        }
        s.into()
    }
}

/// Checks a caller-supplied statement and returns its typed form.
///
/// The bind list may be named `values` or `params`.
pub fn validate_statement(value: &WireValue) -> Result<Statement> {
    let s = value
        .as_struct()
        .ok_or_else(|| DfpError::Validation("statement must be a struct".into()))?;

    for key in s.fields().keys() {
        if !matches!(key.as_str(), "query" | "values" | "params") {
            return Err(DfpError::Validation(format!("unknown statement field {key:?}")));
        }
    }

    let query = match s.get("query") {
        Some(WireValue::Scalar(q)) => q.clone(),
        None | Some(WireValue::Nil) => String::new(),
        Some(_) => return Err(DfpError::Validation("statement query must be text".into())),
    };

    let list = match (s.get("values"), s.get("params")) {
        (Some(_), Some(_)) => {
            return Err(DfpError::Validation(
                "statement cannot have both values and params".into(),
            ));
        }
        (Some(list), None) | (None, Some(list)) => list.clone().into_seq(),
        (None, None) => Vec::new(),
    };

    if list.len() > MAX_STATEMENT_VALUES {
        return Err(DfpError::Validation(format!(
            "a statement accepts at most {MAX_STATEMENT_VALUES} value, got {}",
            list.len()
        )));
    }

    let values = list
        .iter()
        .map(|entry| {
            let e = entry
                .as_struct()
                .ok_or_else(|| DfpError::Validation("statement value must be a struct".into()))?;
            let key = e
                .get_str("key")
                .ok_or_else(|| DfpError::Validation("statement value needs a key".into()))?;
            let value = e
                .get("value")
                .ok_or_else(|| DfpError::Validation(format!("statement value {key:?} is empty")))?;
            Ok(StatementValue {
                key: key.to_string(),
                value: Value::try_from(value)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let statement = Statement { query, values };
    statement.validate()?;
    Ok(statement)
}
