// Import necessary libraries for file I/O and serialization.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};

// Define a structure to hold application settings with serialization and
// deserialization capabilities.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    pub language: String, // Preferred language for game prose.
    pub authorization_key: Option<String>, // Credential for the narrative service token endpoint.
    pub client_id: String, // Client id sent with every narration request.
    pub model: String,
    pub token_url: String,
    pub chat_url: String,
    pub debug_mode: bool, // Flag to enable or disable debug mode.
}

// Implement the Default trait for Settings to provide a method to create default settings.
impl Default for Settings {
    fn default() -> Self {
        Settings {
            language: "English".to_string(), // Default language setting.
            authorization_key: None,         // No credential by default.
            client_id: String::new(),
            model: "GigaChat".to_string(),
            token_url: "https://ngw.devices.sberbank.ru:9443/api/v2/oauth".to_string(),
            chat_url: "https://gigachat.devices.sberbank.ru/api/v1/chat/completions".to_string(),
            debug_mode: false, // Debug mode disabled by default.
        }
    }
}

// Additional implementation block for Settings.
impl Settings {
    // Constructor function to create new settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    // Load settings from the default file path.
    pub fn load() -> io::Result<Self> {
        Self::load_settings_from_file("./data/settings.json")
    }

    // Save current settings to the default file path.
    pub fn save(&self) -> io::Result<()> {
        std::fs::create_dir_all("./data")?; // Ensure the data directory exists.
        self.save_to_file("./data/settings.json")
    }

    // Load settings from a specified file path.
    pub fn load_settings_from_file(path: &str) -> io::Result<Self> {
        let data = fs::read_to_string(path)?; // Read settings from file.
        let settings = serde_json::from_str(&data)?; // Deserialize JSON data into settings.
        Ok(settings)
    }

    // Save current settings to a specified file path.
    pub fn save_to_file(&self, path: &str) -> io::Result<()> {
        let data = serde_json::to_string_pretty(self)?; // Serialize settings into pretty JSON format.
        if let Some(parent) = std::path::Path::new(path).parent() {
            fs::create_dir_all(parent)?; // Create the directory if it doesn't exist.
        }
        let mut file = fs::File::create(path)?; // Create or overwrite the file.
        file.write_all(data.as_bytes())?; // Write the serialized data to the file.
        Ok(())
    }
}
