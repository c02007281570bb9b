use tracing::debug;
use wikiscribe_common::{AgentConfig, Result};
use wikiscribe_llm::{LlmClient, LlmRequest};

/// One-shot completion using the agent's persona, temperature and token limit.
pub(crate) async fn ask(llm: &dyn LlmClient, config: &AgentConfig, prompt: String) -> Result<String> {
    let request = LlmRequest::prompt(config.system_prompt(), prompt)
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);

    let response = llm.complete(request).await?;

    debug!(
        agent = %config.id,
        provider = %llm.provider_name(),
        model = %response.model,
        chars = response.content.len(),
        prompt_tokens = response.usage.as_ref().map(|u| u.prompt_tokens),
        completion_tokens = response.usage.as_ref().map(|u| u.completion_tokens),
        "LLM call finished"
    );

    Ok(response.content)
}
