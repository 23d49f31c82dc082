use crate::llm::client::{resolve_model, FragmentStream, LLMClient, ProviderFactory};
use crate::rag::embeddings::OpenAIEmbedder;
use crate::types::{AppError, ChatMessage, MessageRole, Result};
use crate::utils::toml_config::AppConfigManager;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestDeveloperMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use futures::StreamExt;
use pdfchat_vector::Embedder;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Build an async-openai client for one request's credentials.
///
/// The client's built-in retry on 429 and 5xx is turned off: provider
/// failures surface to the caller on the first response.
pub(crate) fn build_client(api_key: &str, api_base: &str) -> Client<OpenAIConfig> {
    let config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(api_base);

    let no_retry = ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();

    Client::with_config(config).with_backoff(no_retry)
}

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAIClient {
    pub fn new(api_key: &str, api_base: &str, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(api_key, api_base),
            model: model.into(),
            timeout,
        }
    }

    fn request(&self, messages: &[ChatMessage], stream: bool) -> Result<CreateChatCompletionRequest> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Generation(format!("Failed to build request: {}", e)))?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if stream {
            args.stream(true);
        }

        args.build()
            .map_err(|e| AppError::Generation(format!("Failed to build request: {}", e)))
    }

    fn timed_out(&self) -> AppError {
        AppError::Timeout(format!(
            "OpenAI did not respond within {}s",
            self.timeout.as_secs()
        ))
    }
}

fn to_request_message(
    message: &ChatMessage,
) -> std::result::Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.clone();

    Ok(match message.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Developer => ChatCompletionRequestDeveloperMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = self.request(messages, false)?;

        let response = timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| AppError::Generation(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Generation("No response from OpenAI".to_string()))
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream> {
        let request = self.request(messages, true)?;

        let mut stream = timeout(self.timeout, self.client.chat().create_stream(request))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| AppError::Generation(format!("OpenAI API error: {}", e)))?;

        let idle = self.timeout;
        let result_stream = async_stream::stream! {
            loop {
                let next = match timeout(idle, stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        yield Err(AppError::Timeout(format!(
                            "no stream data for {}s",
                            idle.as_secs()
                        )));
                        break;
                    }
                };

                match next {
                    Some(Ok(response)) => {
                        for choice in response.choices {
                            if let Some(content) = choice.delta.content {
                                if !content.is_empty() {
                                    yield Ok(content);
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        yield Err(AppError::Generation(format!("Stream error: {}", e)));
                        break;
                    }
                    None => break,
                }
            }
        };

        Ok(Box::pin(result_stream))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Creates OpenAI-compatible clients from the live configuration.
pub struct OpenAIProviderFactory {
    config: Arc<AppConfigManager>,
}

impl OpenAIProviderFactory {
    pub fn new(config: Arc<AppConfigManager>) -> Self {
        Self { config }
    }
}

impl ProviderFactory for OpenAIProviderFactory {
    fn llm_client(&self, api_key: &str, model: Option<&str>) -> Result<Box<dyn LLMClient>> {
        let config = self.config.config();
        let model = resolve_model(model, &config.llm.default_model);

        Ok(Box::new(OpenAIClient::new(
            api_key,
            &config.llm.api_base,
            model,
            config.llm.request_timeout(),
        )))
    }

    fn embedder(&self, api_key: &str) -> Result<Box<dyn Embedder>> {
        let config = self.config.config();

        Ok(Box::new(OpenAIEmbedder::new(
            api_key,
            &config.llm.api_base,
            &config.llm.embedding_model,
            config.rag.embedding_batch_size,
            config.llm.request_timeout(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::AppConfig;

    #[test]
    fn test_request_maps_roles() {
        let client = OpenAIClient::new(
            "sk-test",
            "http://localhost:1/v1",
            "gpt-4o-mini",
            Duration::from_secs(5),
        );
        let request = client
            .request(
                &[
                    ChatMessage::developer("be terse"),
                    ChatMessage::user("hello"),
                ],
                true,
            )
            .unwrap();

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.stream, Some(true));
        assert!(matches!(
            request.messages[0],
            ChatCompletionRequestMessage::Developer(_)
        ));
        assert!(matches!(
            request.messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
    }

    #[test]
    fn test_factory_uses_default_model() {
        let mut config = AppConfig::default();
        config.llm.default_model = "my-default".to_string();
        let factory = OpenAIProviderFactory::new(Arc::new(AppConfigManager::from_config(config)));

        let client = factory.llm_client("sk-test", None).unwrap();
        assert_eq!(client.model_name(), "my-default");

        let client = factory.llm_client("sk-test", Some("gpt-4o")).unwrap();
        assert_eq!(client.model_name(), "gpt-4o");
    }

    #[test]
    fn test_factory_embedder_uses_embedding_model() {
        let factory =
            OpenAIProviderFactory::new(Arc::new(AppConfigManager::from_config(AppConfig::default())));

        let embedder = factory.embedder("sk-test").unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
    }
}
