use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, Request};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{Result, WikiError};
use crate::store::RecordStore;
use crate::utils::str_field;

const DATA_ENDPOINT: &str = "/api/rest_v1/namespace/data";

/// Page ceilings for the two fetch modes.
pub const FULL_PAGE_LIMIT: u32 = 1000;
pub const FILTERED_PAGE_LIMIT: u32 = 100;

/// Server-side id filter: everything in `Data:` except localization and translation tables.
const DATA_ID_REGEX: &str = r"^Data[:](?!DST_Strings|DS_Strings|ItemTranslation)";

/// One page of the REST data endpoint.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(rename = "_returned")]
    pub returned: u64,
    #[serde(rename = "_embedded", default)]
    pub embedded: Vec<Value>,
}

/// Anything that can hand out pages by zero-based index.
pub trait PageSource {
    fn fetch_page(&mut self, index: u32) -> Result<Page>;
}

pub struct HttpPageSource {
    client: Client,
    url: String,
    page_size: u32,
    filter: Option<String>,
}

impl HttpPageSource {
    pub fn new(client: Client, host: &str, page_size: u32) -> Self {
        HttpPageSource {
            client,
            url: format!("{}{}", host.trim_end_matches('/'), DATA_ENDPOINT),
            page_size,
            filter: None,
        }
    }

    /// Ask the server to skip localization and translation records.
    pub fn filtered(mut self) -> Self {
        let filter = json!({ "_id": { "$regex": DATA_ID_REGEX } });
        self.filter = Some(filter.to_string());
        self
    }

    /// GET for the zero-based page `index`; the endpoint counts pages from 1.
    pub fn request(&self, index: u32) -> Result<Request> {
        let mut query = vec![
            ("pagesize", self.page_size.to_string()),
            ("page", (index + 1).to_string()),
        ];
        if let Some(filter) = &self.filter {
            query.push(("count", "1".to_string()));
            query.push(("filter", filter.clone()));
        }
        Ok(self.client.get(&self.url).query(&query).build()?)
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&mut self, index: u32) -> Result<Page> {
        let request = self.request(index)?;
        let page = self
            .client
            .execute(request)?
            .error_for_status()?
            .json::<Page>()?;
        Ok(page)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub pages: u32,
    pub records: usize,
    pub stored: usize,
}

/// Pull pages `start_from..page_limit` into `store`, saving after every page.
///
/// Stops at the first page that returns nothing. Any request failure aborts
/// the run; pages saved before it stay on disk.
pub fn fetch_all(
    source: &mut impl PageSource,
    store: &mut RecordStore,
    start_from: u32,
    page_limit: u32,
    delay: Duration,
) -> Result<FetchStats> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    let mut stats = FetchStats::default();

    for index in start_from..page_limit {
        info!("query page {}", index);
        pb.set_message(format!("page {} ({} records)", index, store.len()));

        let page = source.fetch_page(index)?;
        if page.returned == 0 {
            debug!("page {} returned nothing, stopping", index);
            break;
        }

        for record in page.embedded {
            let id = str_field(&record, "_id")
                .ok_or_else(|| WikiError::missing(&format!("page {}", index + 1), "_id"))?
                .to_string();
            store.insert(id, record)?;
            stats.records += 1;
        }

        store.save()?;
        stats.pages += 1;
        pb.tick();

        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    pb.finish_and_clear();
    stats.stored = store.len();
    info!(
        "Fetched {} pages ({} records), {} stored in {:?}",
        stats.pages,
        stats.records,
        stats.stored,
        store.path()
    );
    Ok(stats)
}
