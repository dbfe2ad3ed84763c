//! Payload carried by the approve/deny buttons: `<action>:<request id>`.
//!
//! The action never contains the separator, so decoding splits on the first
//! one. Inside the id, `\` and `:` are escaped with a leading `\`.

use std::str::FromStr;

use crate::approval::Decision;
use crate::error::CallbackDataError;
use crate::model::request::RequestId;

const SEPARATOR: char = ':';
const ESCAPE: char = '\\';

pub fn encode(decision: Decision, id: &RequestId) -> String {
    let mut data = decision.to_string();
    data.push(SEPARATOR);

    for c in id.as_str().chars() {
        if c == SEPARATOR || c == ESCAPE {
            data.push(ESCAPE);
        }
        data.push(c);
    }

    data
}

pub fn decode(data: &str) -> Result<(Decision, RequestId), CallbackDataError> {
    let (action, escaped) = data
        .split_once(SEPARATOR)
        .ok_or(CallbackDataError::MissingSeparator)?;

    let decision = Decision::from_str(action)
        .map_err(|_| CallbackDataError::UnknownAction(action.to_string()))?;

    let mut id = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => id.push(chars.next().ok_or(CallbackDataError::DanglingEscape)?),
            SEPARATOR => return Err(CallbackDataError::UnescapedSeparator),
            other => id.push(other),
        }
    }

    if id.is_empty() {
        return Err(CallbackDataError::EmptyId);
    }

    Ok((decision, RequestId::new(id)))
}
