//! Integration tests for the MediaWiki client
//!
//! A mock `/w/api.php` stands in for Wikipedia. Tests cover search, page
//! resolution (missing, disambiguation, auto-suggest), summaries, and the
//! scraping path that fetches rendered article HTML.


use edutoon::scrape::page_content_for;
use edutoon::wiki::{lookup_summary, KnowledgeSource, WikiError, WikipediaClient};
use test_helpers::wikipedia_section;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_json(server: &MockServer, params: &[(&str, &str)], body: serde_json::Value) {
    let mut mock = Mock::given(method("GET")).and(path("/w/api.php"));
    for (key, value) in params {
        mock = mock.and(query_param(*key, *value));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_ohms_law_page(server: &MockServer) {
    mount_json(
        server,
        &[("prop", "info|pageprops"), ("titles", "Ohm's law")],
        serde_json::json!({
            "query": {"pages": [{
                "pageid": 22,
                "title": "Ohm's law",
                "fullurl": format!("{}/wiki/Ohm%27s_law", server.uri())
            }]}
        }),
    )
    .await;
}

#[tokio::test]
async fn test_search_returns_titles_and_suggestion() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        &[("list", "search"), ("srsearch", "ohms lw")],
        serde_json::json!({
            "query": {
                "searchinfo": {"totalhits": 2, "suggestion": "ohms law"},
                "search": [{"ns": 0, "title": "Ohm's law"}, {"ns": 0, "title": "Ohm"}]
            }
        }),
    )
    .await;

    let client = WikipediaClient::new(&wikipedia_section(&server.uri())).unwrap();
    let results = client.search("ohms lw", 10).await.unwrap();

    assert_eq!(results.titles, vec!["Ohm's law", "Ohm"]);
    assert_eq!(results.suggestion.as_deref(), Some("ohms law"));
}

#[tokio::test]
async fn test_summary_fetches_intro_extract() {
    let server = MockServer::start().await;
    mount_ohms_law_page(&server).await;
    mount_json(
        &server,
        &[("prop", "extracts"), ("pageids", "22"), ("exsentences", "5")],
        serde_json::json!({
            "query": {"pages": [{"pageid": 22, "extract": "Ohm's law states that V = IR.\n"}]}
        }),
    )
    .await;

    let client = WikipediaClient::new(&wikipedia_section(&server.uri())).unwrap();
    let summary = client.summary("Ohm's law", 5, false).await.unwrap();

    assert_eq!(summary, "Ohm's law states that V = IR.");
}

#[tokio::test]
async fn test_missing_page_is_page_not_found() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        &[("prop", "info|pageprops"), ("titles", "Zzxqv")],
        serde_json::json!({"query": {"pages": [{"title": "Zzxqv", "missing": true}]}}),
    )
    .await;

    let client = WikipediaClient::new(&wikipedia_section(&server.uri())).unwrap();
    let err = client.page("Zzxqv", false).await.unwrap_err();

    assert!(matches!(err, WikiError::PageNotFound(_)));
}

#[tokio::test]
async fn test_disambiguation_page_lists_options() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        &[("prop", "info|pageprops"), ("titles", "Mercury")],
        serde_json::json!({
            "query": {"pages": [{
                "pageid": 7,
                "title": "Mercury",
                "fullurl": "https://en.wikipedia.org/wiki/Mercury",
                "pageprops": {"disambiguation": ""}
            }]}
        }),
    )
    .await;
    mount_json(
        &server,
        &[("prop", "links"), ("titles", "Mercury")],
        serde_json::json!({
            "query": {"pages": [{
                "title": "Mercury",
                "links": [{"ns": 0, "title": "Mercury (planet)"}, {"ns": 0, "title": "Mercury (element)"}]
            }]}
        }),
    )
    .await;

    let client = WikipediaClient::new(&wikipedia_section(&server.uri())).unwrap();
    match client.page("Mercury", false).await.unwrap_err() {
        WikiError::Disambiguation { title, options } => {
            assert_eq!(title, "Mercury");
            assert_eq!(options, vec!["Mercury (planet)", "Mercury (element)"]);
        }
        other => panic!("expected disambiguation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_auto_suggest_uses_top_search_hit() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        &[("list", "search"), ("srsearch", "ohms law")],
        serde_json::json!({"query": {"search": [{"ns": 0, "title": "Ohm's law"}]}}),
    )
    .await;
    mount_ohms_law_page(&server).await;

    let client = WikipediaClient::new(&wikipedia_section(&server.uri())).unwrap();
    let page = client.page("ohms law", true).await.unwrap();

    assert_eq!(page.title, "Ohm's law");
    assert_eq!(page.page_id, 22);
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        &[("list", "search")],
        serde_json::json!({"error": {"code": "maxlag", "info": "Waiting for a database server"}}),
    )
    .await;

    let client = WikipediaClient::new(&wikipedia_section(&server.uri())).unwrap();
    let err = client.search("anything", 10).await.unwrap_err();

    assert!(matches!(err, WikiError::Api(msg) if msg.contains("maxlag")));
}

#[tokio::test]
async fn test_lookup_falls_back_to_search_over_http() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        &[("prop", "info|pageprops"), ("titles", "cache mem")],
        serde_json::json!({"query": {"pages": [{"title": "Cache mem", "missing": true}]}}),
    )
    .await;
    mount_json(
        &server,
        &[("list", "search"), ("srsearch", "cache mem")],
        serde_json::json!({"query": {"search": [{"ns": 0, "title": "Ohm's law"}]}}),
    )
    .await;
    mount_ohms_law_page(&server).await;
    mount_json(
        &server,
        &[("prop", "extracts"), ("pageids", "22")],
        serde_json::json!({"query": {"pages": [{"pageid": 22, "extract": "Resolved text."}]}}),
    )
    .await;

    let client = WikipediaClient::new(&wikipedia_section(&server.uri())).unwrap();
    let lookup = lookup_summary(&client, "cache mem", 5, false).await.unwrap();

    assert_eq!(lookup.text, "Resolved text.");
    assert_eq!(lookup.resolved_title.as_deref(), Some("Ohm's law"));
}

#[tokio::test]
async fn test_page_content_scrapes_rendered_article() {
    let server = MockServer::start().await;
    mount_ohms_law_page(&server).await;

    Mock::given(method("GET"))
        .and(path("/wiki/Ohm%27s_law"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
<p>Ohm's law states that the current through a conductor is proportional to the voltage across it.</p>
<p>Ohm's law: <math alttext="V=IR"></math></p>
</body></html>"#,
        ))
        .mount(&server)
        .await;

    let client = WikipediaClient::new(&wikipedia_section(&server.uri())).unwrap();
    let content = page_content_for(&client, "Ohm's law", false).await;

    assert_eq!(content.formulas.len(), 1);
    assert_eq!(content.formulas[0].tex, "V=IR");
    assert_eq!(content.formulas[0].name.as_deref(), Some("Ohm's law"));
    assert!(content.details.starts_with("Ohm's law states"));
}

#[tokio::test]
async fn test_page_content_is_empty_when_article_unreachable() {
    let server = MockServer::start().await;
    mount_ohms_law_page(&server).await;

    Mock::given(method("GET"))
        .and(path("/wiki/Ohm%27s_law"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = WikipediaClient::new(&wikipedia_section(&server.uri())).unwrap();
    let content = page_content_for(&client, "Ohm's law", false).await;

    assert!(content.formulas.is_empty());
    assert!(content.details.is_empty());
}
