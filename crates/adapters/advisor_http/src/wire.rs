//! JSON documents exchanged with the decision service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use gardenhub_domain::advisory::{AdvisorResponse, AdvisoryRequest, ToolCall, WeatherContext};
use gardenhub_domain::device_state::{ControlMode, DeviceState};

use crate::error::AdvisorError;

const TEXT: &str = "TEXT";
const TOOL_CALL: &str = "TOOL_CALL";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    user_message: &'a str,
    device_uid: &'a str,
    garden_context: &'a DeviceState,
    weather_context: &'a WeatherContext,
    /// Set for `MANUAL` devices: the answer is shown, never executed.
    advisory_only: bool,
}

impl<'a> From<&'a AdvisoryRequest> for ChatRequest<'a> {
    fn from(request: &'a AdvisoryRequest) -> Self {
        Self {
            user_message: &request.prompt,
            device_uid: request.device_id.as_str(),
            garden_context: &request.garden,
            weather_context: &request.weather,
            advisory_only: request.mode == ControlMode::Manual,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    response_type: String,
    #[serde(default)]
    text_content: Option<String>,
    #[serde(default)]
    tool_call: Option<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    tool_name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

impl TryFrom<ChatResponse> for AdvisorResponse {
    type Error = AdvisorError;

    fn try_from(response: ChatResponse) -> Result<Self, Self::Error> {
        if response.response_type.eq_ignore_ascii_case(TOOL_CALL) {
            let call = response.tool_call.ok_or(AdvisorError::MissingToolCall)?;
            Ok(Self::ToolCall(ToolCall {
                name: call.tool_name,
                arguments: call.arguments,
            }))
        } else if response.response_type.eq_ignore_ascii_case(TEXT) {
            Ok(Self::Text(response.text_content.unwrap_or_default()))
        } else {
            Err(AdvisorError::UnknownResponseType(response.response_type))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gardenhub_domain::id::DeviceId;
    use serde_json::json;

    fn decode(value: Value) -> Result<AdvisorResponse, AdvisorError> {
        serde_json::from_value::<ChatResponse>(value).unwrap().try_into()
    }

    #[test]
    fn should_encode_request_with_snake_case_envelope() {
        let device_id = DeviceId::new("g1").unwrap();
        let request = AdvisoryRequest {
            prompt: "Should I water?".to_string(),
            device_id: device_id.clone(),
            garden: DeviceState::offline(device_id),
            weather: WeatherContext::unknown("Hanoi"),
            mode: ControlMode::Manual,
        };

        let encoded = serde_json::to_value(ChatRequest::from(&request)).unwrap();

        assert_eq!(encoded["user_message"], "Should I water?");
        assert_eq!(encoded["device_uid"], "g1");
        assert_eq!(encoded["garden_context"]["deviceId"], "g1");
        assert_eq!(encoded["weather_context"]["forecast"], "unknown");
        assert_eq!(encoded["weather_context"]["rainExpected"], false);
        assert_eq!(encoded["advisory_only"], true);
    }

    #[test]
    fn should_decode_text_answer() {
        let response = decode(json!({"response_type": "TEXT", "text_content": "All good."})).unwrap();
        assert_eq!(response, AdvisorResponse::Text("All good.".to_string()));
    }

    #[test]
    fn should_decode_tool_call_answer() {
        let response = decode(json!({
            "response_type": "TOOL_CALL",
            "tool_call": {
                "tool_name": "controlDevice",
                "arguments": {"deviceUid": "g1", "deviceName": "PUMP", "turnOn": true, "durationMinutes": 5}
            }
        }))
        .unwrap();

        let AdvisorResponse::ToolCall(call) = response else {
            panic!("expected a tool call");
        };
        assert_eq!(call.name, "controlDevice");
        assert_eq!(call.arguments["durationMinutes"], 5);
    }

    #[test]
    fn should_reject_tool_call_without_body() {
        let result = decode(json!({"response_type": "TOOL_CALL"}));
        assert!(matches!(result, Err(AdvisorError::MissingToolCall)));
    }

    #[test]
    fn should_reject_unknown_response_type() {
        let result = decode(json!({"response_type": "IMAGE"}));
        assert!(matches!(result, Err(AdvisorError::UnknownResponseType(kind)) if kind == "IMAGE"));
    }
}
