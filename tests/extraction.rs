use browser_scrape::dom::HtmlDocument;
use browser_scrape::scrape::{Collected, CollectField, ExtractionRequest, Extractor, ScrapeRequest, ScrapeResponse};
use std::time::Duration;

const MENU_PAGE: &str = r#"
<html><head><title>Cafe</title></head><body>
  <h1>  Daily
     Menu </h1>
  <nav><a href="/">Home</a><a href="/about">About</a><a>Soon</a></nav>
  <table id="menu">
    <tr class="section"><th colspan="2">Drinks</th></tr>
    <tr class="item" data-id="1"><td class="name">Tea</td><td class="price">2.50</td></tr>
    <tr class="item" data-id="2"><td class="name">Coffee</td><td class="price">3.00</td></tr>
    <tr class="section"><th colspan="2">Cakes</th></tr>
    <tr class="item" data-id="3"><td class="name">Brownie</td><td class="price">4.25</td></tr>
    <tr class="item"><td class="name"></td><td class="price"></td></tr>
  </table>
  <ul class="reviews">
    <li><span class="author">Ana</span><p>Great tea</p></li>
    <li><span class="author">Ben</span><p>Nice <b>cakes</b></p></li>
  </ul>
</body></html>
"#;

fn extract(request: &ExtractionRequest) -> browser_scrape::scrape::Extraction {
    let doc = HtmlDocument::parse(MENU_PAGE);
    let accessor = doc.accessor();
    Extractor::new(&accessor).run(request)
}

fn records(collected: &Collected) -> &[indexmap::IndexMap<String, String>] {
    match collected {
        Collected::Records(records) => records,
        _ => panic!("expected records"),
    }
}

#[test]
fn test_single_values() {
    let request = ExtractionRequest::new()
        .get("title", "h1")
        .get("first_id", "tr.item(data-id)")
        .get("first_price", "td.name<tr<td.price")
        .get("first_review", "span.author < li > p")
        .get("second_price", "td.name < tr + td.price")
        .get("missing", "table.prices td");

    let extraction = extract(&request);
    let get = &extraction.data.get;

    assert_eq!(get["title"], "Daily Menu");
    assert_eq!(get["first_id"], "1");
    assert_eq!(get["first_price"], "2.50");
    assert_eq!(get["first_review"], "Great tea");
    assert_eq!(get["second_price"], "3.00");
    assert_eq!(get["missing"], "");
    assert!(extraction.errors.is_empty());
}

#[test]
fn test_value_collections() {
    let request = ExtractionRequest::new()
        .collect("prices", CollectField::new("td.price"))
        .collect("authors", CollectField::new("p<li<span.author"))
        .collect("filled", CollectField { drop_empty: Some(true), ..CollectField::new("td.price") });

    let extraction = extract(&request);
    let collect = &extraction.data.collect;

    assert_eq!(collect["prices"], Collected::Values(vec!["2.50".into(), "3.00".into(), "4.25".into(), "".into()]));
    assert_eq!(collect["authors"], Collected::Values(vec!["Ana".into(), "Ben".into()]));
    assert_eq!(collect["filled"].len(), 3);
}

#[test]
fn test_records_with_sticky_section() {
    let rows = CollectField::new("tr")
        .with_field("section", "th")
        .with_field("name", "td.name")
        .with_field("price", "td.price")
        .with_sticky("section");
    let rows = CollectField { drop_empty: Some(true), ..rows };

    let extraction = extract(&ExtractionRequest::new().collect("rows", rows));
    let rows = records(&extraction.data.collect["rows"]);

    let sections: Vec<&str> = rows.iter().map(|r| r["section"].as_str()).collect();
    let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str()).collect();
    assert_eq!(sections, ["Drinks", "Drinks", "Drinks", "Cakes", "Cakes"]);
    assert_eq!(names, ["", "Tea", "Coffee", "", "Brownie"]);
}

#[test]
fn test_record_recipes_relative_to_anchor() {
    let items = CollectField::new("tr.item")
        .with_field("id", "(data-id)")
        .with_field("name", "td.name")
        .with_field("table", ">> >> (id)")
        .with_field("menu", "* h1")
        .with_field("next_price", "td.name < tr + td.price");

    let extraction = extract(&ExtractionRequest::new().collect("items", items));
    let items = records(&extraction.data.collect["items"]);

    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["id"], "1");
    assert_eq!(items[0]["table"], "menu");
    assert_eq!(items[0]["menu"], "Daily Menu");
    assert_eq!(items[0]["next_price"], "3.00");
    assert_eq!(items[2]["next_price"], "");
    assert_eq!(items[3]["id"], "");
    assert!(extraction.errors.is_empty());
}

#[test]
fn test_own_text_and_parent_recipes() {
    let reviews = CollectField::new("span.author")
        .with_field("author", "text")
        .with_field("review", "parent p")
        .with_field("list", "* (class)");

    let extraction = extract(&ExtractionRequest::new().collect("reviews", reviews));
    let reviews = records(&extraction.data.collect["reviews"]);

    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[1]["author"], "Ben");
    assert_eq!(reviews[1]["review"], "Nice cakes");
    assert!(extraction.errors.contains_key("collect.reviews.list"));
}

#[test]
fn test_failures_are_reported_per_field() {
    let request = ExtractionRequest::new()
        .get("title", "h1")
        .get("broken", "td<")
        .collect("items", CollectField::new("tr.item").with_field("name", "td.name").with_field("bad", "a()"))
        .collect("nowhere", CollectField::new("(href)"));

    let extraction = extract(&request);

    assert_eq!(extraction.data.get["title"], "Daily Menu");
    assert_eq!(extraction.data.get["broken"], "");
    assert!(extraction.errors.contains_key("get.broken"));
    assert!(extraction.errors.contains_key("collect.items.bad"));
    assert!(extraction.errors.contains_key("collect.nowhere"));

    let items = records(&extraction.data.collect["items"]);
    assert_eq!(items[1]["name"], "Coffee");
    assert_eq!(items[1]["bad"], "");
    assert_eq!(extraction.data.collect["nowhere"], Collected::Values(Vec::new()));
}

#[test]
fn test_links_and_debug_markup() {
    let request = ExtractionRequest { extract_links: true, debug: true, ..ExtractionRequest::new() };
    let extraction = extract(&request);

    assert_eq!(extraction.links, Some(vec!["/".to_string(), "/about".to_string()]));
    assert!(extraction.debug_html.unwrap().contains("<table id=\"menu\">"));
}

#[test]
fn test_request_to_response_json() {
    let request: ScrapeRequest = serde_json::from_value(serde_json::json!({
        "url": "https://cafe.example/menu",
        "get": { "title": "h1", "broken": "td<" },
        "collect": {
            "items": { "selector": "tr.item", "fields": { "name": "td.name", "id": { "selector": "", "attr": "data-id" } } }
        }
    }))
    .unwrap();

    let extraction = extract(&request.extraction);
    let response = ScrapeResponse::completed(request.url.clone(), extraction, Duration::from_millis(250));
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["url"], "https://cafe.example/menu");
    assert_eq!(json["data"]["get"]["title"], "Daily Menu");
    assert_eq!(json["data"]["collect"]["items"][0], serde_json::json!({"name": "Tea", "id": "1"}));
    assert!(json["errors"]["get.broken"].is_string());
    assert!(json.get("error").is_none());
    assert_eq!(json["load_time"], 0.25);
}

#[test]
fn test_text_with_markup_in_response_json() {
    let request: ScrapeRequest = serde_json::from_value(serde_json::json!({
        "url": "https://cafe.example/menu",
        "include_html": true,
        "get": { "first_review": "ul.reviews li p", "first_id": "tr.item(data-id)" },
        "collect": { "authors": { "selector": "span.author" } }
    }))
    .unwrap();

    let extraction = extract(&request.extraction);
    let response = ScrapeResponse::completed(request.url.clone(), extraction, Duration::ZERO);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["data"]["get"]["first_review"], serde_json::json!({"text": "Great tea", "html": "<p>Great tea</p>"}));
    assert_eq!(json["data"]["get"]["first_id"], "1");
    assert_eq!(json["data"]["collect"]["authors"][1], serde_json::json!({"text": "Ben", "html": "<span class=\"author\">Ben</span>"}));
    assert!(json.get("images").is_none());
    assert!(json.get("proxy_used").is_none());
}
