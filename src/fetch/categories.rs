use std::collections::BTreeMap;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Request};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, WikiError};
use crate::store::write_json;

const CATEGORY_LIMIT: &str = "400";
const MEMBER_LIMIT: &str = "500";

/// MediaWiki action API, `action=query` only.
pub trait WikiApi {
    fn query(&mut self, params: &[(&str, &str)]) -> Result<Value>;
}

pub struct HttpWikiApi {
    client: Client,
    url: String,
}

impl HttpWikiApi {
    pub fn new(client: Client, host: &str) -> Self {
        HttpWikiApi {
            client,
            url: format!("{}/api.php", host.trim_end_matches('/')),
        }
    }

    /// `action=query` GET with `params` appended.
    pub fn request(&self, params: &[(&str, &str)]) -> Result<Request> {
        let mut query = vec![
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
        ];
        query.extend_from_slice(params);
        Ok(self.client.get(&self.url).query(&query).build()?)
    }
}

impl WikiApi for HttpWikiApi {
    fn query(&mut self, params: &[(&str, &str)]) -> Result<Value> {
        let request = self.request(params)?;
        let value = self
            .client
            .execute(request)?
            .error_for_status()?
            .json::<Value>()?;
        Ok(value)
    }
}

#[derive(Debug, Default)]
pub struct CategoryReport {
    pub categories: usize,
    pub members: usize,
    /// Categories whose member list was cut at the first response.
    pub truncated: Vec<String>,
}

/// List every category, then each category's member titles, writing
/// `out` after every category.
///
/// A member list that needs continuation is kept partial and reported.
// TODO: follow `cmcontinue` once consumers can handle categories over 500 members.
pub fn fetch_categories(
    api: &mut impl WikiApi,
    out: &Path,
    delay: Duration,
) -> Result<CategoryReport> {
    let listing = api.query(&[("list", "allcategories"), ("aclimit", CATEGORY_LIMIT)])?;
    if listing.get("continue").is_some() {
        return Err(WikiError::UnhandledContinuation {
            what: "allcategories".to_string(),
        });
    }
    let names = collect_strings(&listing, "allcategories", "category")?;
    info!("Found {} categories", names.len());

    let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut report = CategoryReport::default();

    for name in names {
        let title = format!("Category:{}", name);
        let members = api.query(&member_params(&title))?;
        if members.get("continue").is_some() {
            warn!("query needs continue: {}", name);
            report.truncated.push(name.clone());
        }

        let titles = collect_strings(&members, "categorymembers", "title")?;
        report.categories += 1;
        report.members += titles.len();
        result.insert(name, titles);

        if !delay.is_zero() {
            thread::sleep(delay);
        }
        write_json(out, &result)?;
    }

    Ok(report)
}

fn member_params(title: &str) -> [(&str, &str); 3] {
    [
        ("list", "categorymembers"),
        ("cmtitle", title),
        ("cmlimit", MEMBER_LIMIT),
    ]
}

/// `response.query.<list>[*].<field>` as strings.
fn collect_strings(response: &Value, list: &str, field: &str) -> Result<Vec<String>> {
    let entries = response
        .get("query")
        .and_then(|q| q.get(list))
        .and_then(Value::as_array)
        .ok_or_else(|| WikiError::missing(list, "query"))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| WikiError::missing(list, field))
        })
        .collect()
}
