//! browser-scrape command line
//!
//! Scrapes a live page through Chrome, or a saved HTML file without a
//! browser, and prints the JSON response on stdout.
//!
//! ```bash
//! browser-scrape --url https://books.toscrape.com \
//!     --get title=h1 \
//!     --collect books=article.product_pod \
//!     --field 'books.title=h3 a(title)' --field 'books.price=.price_color'
//!
//! browser-scrape --html page.html --request request.json
//! ```

use anyhow::{Context, bail};
use browser_scrape::browser::{LaunchOptions, ScrapeService};
use browser_scrape::config::ScraperConfig;
use browser_scrape::dom::HtmlDocument;
use browser_scrape::scrape::{CollectField, Extractor, ScrapeRequest, ScrapeResponse};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "browser-scrape")]
#[command(version)]
#[command(about = "Extract structured data from web pages with selector notation", long_about = None)]
struct Cli {
    /// Page to load in Chrome
    #[arg(long, value_name = "URL", required_unless_present_any = ["html", "request"])]
    url: Option<String>,

    /// Read a saved HTML file instead of loading a page
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    /// JSON request file; flags below add to it
    #[arg(long, short = 'r', value_name = "FILE")]
    request: Option<PathBuf>,

    /// Single value, `name=notation` (repeatable)
    #[arg(long, short = 'g', value_name = "NAME=NOTATION", value_parser = parse_pair)]
    get: Vec<(String, String)>,

    /// Collection, `name=selector` (repeatable)
    #[arg(long, short = 'c', value_name = "NAME=SELECTOR", value_parser = parse_pair)]
    collect: Vec<(String, String)>,

    /// Record field of a collection, `collection.field=recipe` (repeatable)
    #[arg(long, short = 'f', value_name = "COLLECTION.FIELD=RECIPE", value_parser = parse_pair)]
    field: Vec<(String, String)>,

    /// Sticky field of a collection, `collection=field` (repeatable)
    #[arg(long, value_name = "COLLECTION=FIELD", value_parser = parse_pair)]
    sticky: Vec<(String, String)>,

    /// Include every link of the page
    #[arg(long)]
    links: bool,

    /// Include every image source of the page
    #[arg(long)]
    images: bool,

    /// Return text together with markup for text fields
    #[arg(long)]
    include_html: bool,

    /// Include the page markup
    #[arg(long)]
    debug: bool,

    /// Selector to wait for after loading
    #[arg(long, value_name = "SELECTOR")]
    wait_for: Option<String>,

    /// Seconds to wait after navigation
    #[arg(long, value_name = "SECONDS")]
    wait_time: Option<u64>,

    /// Do not route through the configured proxies
    #[arg(long)]
    no_proxy: bool,

    /// Launch browser in headed mode (overrides HEADLESS)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

impl Cli {
    /// The request file (if any) with every flag applied on top
    fn build_request(&self) -> anyhow::Result<ScrapeRequest> {
        let mut value = match &self.request {
            Some(path) => {
                let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            None => serde_json::json!({}),
        };

        let url = self.url.clone().or_else(|| self.html.as_ref().map(|path| format!("file://{}", path.display())));
        if let Some(url) = url {
            value["url"] = serde_json::Value::String(url);
        }
        let mut request: ScrapeRequest = serde_json::from_value(value).context("invalid request")?;

        let extraction = &mut request.extraction;
        for (name, notation) in &self.get {
            extraction.get.insert(name.clone(), notation.as_str().into());
        }
        for (name, selector) in &self.collect {
            extraction.collect.insert(name.clone(), CollectField::new(selector.clone()));
        }
        for (path, recipe) in &self.field {
            let Some((collection, field)) = path.split_once('.') else {
                bail!("--field expects COLLECTION.FIELD=RECIPE, got '{}'", path);
            };
            let Some(entry) = extraction.collect.get_mut(collection) else {
                bail!("--field refers to unknown collection '{}'", collection);
            };
            entry.fields.get_or_insert_with(Default::default).insert(field.to_string(), recipe.as_str().into());
        }
        for (collection, field) in &self.sticky {
            let Some(entry) = extraction.collect.get_mut(collection) else {
                bail!("--sticky refers to unknown collection '{}'", collection);
            };
            entry.sticky = Some(field.clone());
        }

        extraction.extract_links |= self.links;
        extraction.extract_images |= self.images;
        extraction.include_html |= self.include_html;
        extraction.debug |= self.debug;
        if self.no_proxy {
            request.use_proxy = false;
        }
        if let Some(selector) = &self.wait_for {
            request.wait_for = Some(selector.clone());
        }
        if let Some(seconds) = self.wait_time {
            request.wait_time = seconds;
        }

        if request.extraction.is_empty() {
            log::warn!("Nothing to extract; add --get, --collect, --links or a request file");
        }
        Ok(request)
    }
}

/// Run the extraction against a saved page
fn scrape_file(path: &Path, request: &ScrapeRequest, config: &ScraperConfig) -> anyhow::Result<ScrapeResponse> {
    let started = Instant::now();
    let markup = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let document = HtmlDocument::parse(&markup);
    let accessor = document.accessor();
    let extraction = Extractor::new(&accessor).drop_empty_default(config.drop_empty_records).run(&request.extraction);

    Ok(ScrapeResponse::completed(request.url.clone(), extraction, started.elapsed()))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let request = cli.build_request()?;
    let config = ScraperConfig::from_env()?;

    let response = match &cli.html {
        Some(path) => scrape_file(path, &request, &config)?,
        None => {
            let mut launch = LaunchOptions::from_config(&config);
            if cli.headed {
                launch = launch.headless(false);
            }
            ScrapeService::new(config)?.with_launch_options(launch).scrape(&request)
        }
    };

    let output =
        if cli.compact { serde_json::to_string(&response)? } else { serde_json::to_string_pretty(&response)? };
    println!("{}", output);

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("title=h1").unwrap(), ("title".to_string(), "h1".to_string()));
        assert_eq!(parse_pair("link=a[href=x](href)").unwrap().1, "a[href=x](href)");
        assert!(parse_pair("title").is_err());
        assert!(parse_pair("=h1").is_err());
    }

    #[test]
    fn test_flags_build_request() {
        let cli = Cli::parse_from([
            "browser-scrape",
            "--url",
            "https://example.com",
            "--get",
            "title=h1",
            "--collect",
            "rows=tr",
            "--field",
            "rows.name=td.name",
            "--sticky",
            "rows=name",
            "--links",
            "--images",
            "--include-html",
            "--no-proxy",
        ]);
        let request = cli.build_request().unwrap();

        assert_eq!(request.url, "https://example.com");
        assert!(!request.use_proxy);
        assert!(request.extraction.extract_links);
        assert!(request.extraction.extract_images);
        assert!(request.extraction.include_html);
        assert_eq!(request.extraction.get.len(), 1);
        let rows = &request.extraction.collect["rows"];
        assert_eq!(rows.fields.as_ref().unwrap().len(), 1);
        assert_eq!(rows.sticky.as_deref(), Some("name"));
    }

    #[test]
    fn test_field_for_unknown_collection() {
        let cli = Cli::parse_from(["browser-scrape", "--url", "https://example.com", "--field", "rows.name=td"]);
        assert!(cli.build_request().is_err());
    }
}
