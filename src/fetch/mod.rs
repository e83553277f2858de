pub mod categories;
pub mod pages;

use reqwest::blocking::Client;

use crate::config::Settings;
use crate::error::Result;

const USER_AGENT: &str = concat!("dst_wiki/", env!("CARGO_PKG_VERSION"));

/// Blocking client shared by the fetch stages. No timeout unless configured.
pub fn client(settings: &Settings) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(settings.timeout())
        .build()?;
    Ok(client)
}
