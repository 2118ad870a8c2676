// src/extractors/prompt.rs

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant designed to output structured data.";

// Instructions sent ahead of every segment. The rules keep partial records
// mergeable: nothing invented, bare domains, one rate per item, literal
// percentages.
const INSTRUCTIONS: &str = "\
Extract the banking rate data from the following text and structure it according to the provided model.

Special instructions:
- If a property or object does not exist, do not include it in the output.
- Do not include 'www' or other subdomains in the bankRootDomain.
- If dividend rate is given, do not include interest rate.
- Do not convert percentage to decimal. I.e. if the rate is 0.55%, return 0.55 not 0.0055
";

/// Builds the user message for one segment of table text.
pub fn build_user_prompt(segment: &str) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + segment.len() + 8);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\nText:\n");
    prompt.push_str(segment);
    prompt.push('\n');
    prompt
}
