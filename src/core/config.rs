use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub ollama_api_url: String,
    pub ollama_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mongodb_uri = env::var("MONGODB_URI").expect("Missing env var MONGODB_URI");
        let ollama_api_url = env::var("OLLAMA_API_URL")
            .unwrap_or_else(|_| "http://localhost:11434/api/chat".to_string());
        let ollama_model =
            env::var("OLLAMA_MODEL").unwrap_or_else(|_| "deepseek-coder:latest".to_string());

        Self {
            mongodb_uri,
            ollama_api_url,
            ollama_model,
        }
    }
}
