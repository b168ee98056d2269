use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub linkace_url: String,
    pub linkace_api_key: String,
    pub linkace_list_id: i64,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub hugo_content_dir: String,
    pub editor_name: String,
    pub filename_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let linkace_url = env::var("LINKACE_URL")
            .context(Self::missing_var_help("LINKACE_URL"))?
            .trim_end_matches('/')
            .to_string();

        let linkace_api_key =
            env::var("LINKACE_API_KEY").context(Self::missing_var_help("LINKACE_API_KEY"))?;

        let linkace_list_id = env::var("LINKACE_LIST_ID")
            .context(Self::missing_var_help("LINKACE_LIST_ID"))?
            .parse::<i64>()
            .context("LINKACE_LIST_ID must be a numeric list ID")?;

        let openrouter_api_key = env::var("OPENROUTER_API_KEY")
            .context(Self::missing_var_help("OPENROUTER_API_KEY"))?;

        let openrouter_model =
            env::var("OPENROUTER_MODEL").context(Self::missing_var_help("OPENROUTER_MODEL"))?;

        let hugo_content_dir =
            env::var("HUGO_CONTENT_DIR").context(Self::missing_var_help("HUGO_CONTENT_DIR"))?;

        let editor_name = env::var("EDITOR_NAME").unwrap_or_else(|_| "Editor".to_string());

        let filename_prefix =
            env::var("OUTPUT_FILENAME_PREFIX").unwrap_or_else(|_| "weekly-links".to_string());

        Ok(Self {
            linkace_url,
            linkace_api_key,
            linkace_list_id,
            openrouter_api_key,
            openrouter_model,
            hugo_content_dir,
            editor_name,
            filename_prefix,
        })
    }

    fn missing_var_help(name: &str) -> String {
        format!(
            "{} not found.\n\n\
            To fix this, create ~/.config/weekly-digest/.env with:\n  \
            LINKACE_URL=https://your-instance.example.com\n  \
            LINKACE_API_KEY=your_token_here\n  \
            LINKACE_LIST_ID=1\n  \
            OPENROUTER_API_KEY=your_key_here\n  \
            OPENROUTER_MODEL=anthropic/claude-3.5-haiku\n  \
            HUGO_CONTENT_DIR=/path/to/site/content/posts\n\n\
            Get your LinkAce API token from your instance's user settings,\n\
            and your OpenRouter key from: https://openrouter.ai/keys",
            name
        )
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/weekly-digest/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("weekly-digest").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() && dotenvy::from_path(&home_path).is_ok() {
                return;
            }
        }

        // If none found, that's okay - environment variables might be set system-wide
    }
}
