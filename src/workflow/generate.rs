use tracing::{info, warn};

use crate::domain::scenario::{Scenario, parse_scenarios};
use crate::domain::ticket::SourceTicket;
use crate::services::{GenerationRequest, LanguageModelService};

pub const ACCEPTANCE_PROMPT: &str = "You are a senior QA analyst writing acceptance tests.\n\
INPUT RULES:\n\
1. Test the expected behavior. When the input is a bug report, ignore the current or actual \
result and write tests that prove the fix.\n\
2. Only validate that the requirement works as intended.\n\
\n\
FORMAT RULES:\n\
1. Every title MUST start with 'Validate that', e.g. 'Validate that the user is redirected to the app'.\n\
2. Never label titles with prefixes such as 'Bug:', 'Happy Path:', 'Edge Case:' or 'Scenario:'.\n\
3. Cover the expected behavior fully: positive flows and the validations they need.\n\
4. Reply with a single JSON object: {\"scenarios\": [{\"title\": \"...\", \"steps\": \"...\"}]}";

pub const API_PROMPT: &str = "You are a backend QA engineer.\n\
RULES:\n\
1. Validate the API contract: successful responses (200/201) and the expected error handling \
(400/404) described by the requirement.\n\
2. Every title MUST start with 'Validate that'.\n\
3. Reply with a single JSON object: {\"scenarios\": [{\"title\": \"...\", \"steps\": \"...\"}]}";

/// Scenarios from one model call. `provider` names the backend that produced
/// them, or carries the failure message when nothing could be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub scenarios: Vec<Scenario>,
    pub provider: String,
}

impl Generation {
    fn failed(message: String) -> Self {
        warn!(error = %message, "scenario generation failed");
        Self {
            scenarios: Vec::new(),
            provider: message,
        }
    }
}

pub fn system_prompt_for(ticket: &SourceTicket) -> &'static str {
    if ticket.is_backend() {
        API_PROMPT
    } else {
        ACCEPTANCE_PROMPT
    }
}

pub fn user_prompt(ticket: &SourceTicket, context: &str) -> String {
    format!(
        "TASK: {}\nSUMMARY: {}\nCONTEXT:\n{}\n\n\
         INSTRUCTION: Write Gherkin test cases that validate the expected behavior. \
         Every title must start with 'Validate that'. Return JSON.",
        ticket.key, ticket.summary, context
    )
}

/// Asks the model for scenarios; every failure degrades to an empty list.
pub async fn generate_scenarios(
    model: &dyn LanguageModelService,
    ticket: &SourceTicket,
    context: &str,
    max_tests: usize,
) -> Generation {
    let prompt = user_prompt(ticket, context);
    let request = GenerationRequest {
        system_instruction: system_prompt_for(ticket),
        user_prompt: &prompt,
        images: &ticket.attachments,
    };

    let response = match model.generate(&request).await {
        Ok(response) => response,
        Err(err) => return Generation::failed(err.to_string()),
    };

    match parse_scenarios(&response, max_tests) {
        Ok(scenarios) => {
            info!(
                count = scenarios.len(),
                provider = model.provider(),
                "generated scenarios"
            );
            Generation {
                scenarios,
                provider: model.provider().to_string(),
            }
        }
        Err(err) => Generation::failed(format!("unparseable model response: {err}")),
    }
}
