//! Integration tests for the citation enrichment chain against mocked
//! Semantic Scholar, Crossref, and iCite endpoints.

use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pubharvest::citations::{
    CitationEnricher, CitationProvider, CrossrefWorks, ICiteProvider, SemanticScholarProvider,
    TitleSearchProvider,
};
use pubharvest::config::FetchConfig;
use pubharvest::utils::HttpClient;
use pubharvest::{ArticleRecord, CitationSource};

fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        batch_size: 100,
        abstract_batch_size: 10,
        request_delay_ms: 0,
        timeout_secs: 5,
        max_retries: 3,
        base_delay_ms: 1,
        citation_pause_every: 5,
    }
}

fn test_client() -> HttpClient {
    HttpClient::new(Duration::from_secs(5)).expect("client")
}

fn enricher(providers: Vec<Box<dyn CitationProvider>>) -> CitationEnricher {
    CitationEnricher::with_providers(providers, Duration::ZERO, 5)
}

fn record_with_doi(pmid: &str, doi: &str) -> ArticleRecord {
    let mut record = ArticleRecord::new(pmid);
    record.doi = doi.to_string();
    record
}

async fn run_chain(providers: Vec<Box<dyn CitationProvider>>, record: &mut ArticleRecord) {
    enricher(providers)
        .enrich(
            std::slice::from_mut(record),
            &pubharvest::utils::NoopProgress,
        )
        .await;
}

#[tokio::test]
async fn test_semantic_scholar_answers_after_rate_limit_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/paper/DOI:10.1000/xyz"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/paper/DOI:10.1000/xyz"))
        .and(query_param("fields", "citationCount"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"paperId": "abc", "citationCount": 12})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetch = test_fetch_config();
    let provider = SemanticScholarProvider::new(test_client(), &fetch)
        .with_base_url(server.uri())
        .with_fallback(CrossrefWorks::new(test_client(), &fetch).with_base_url(server.uri()));

    let mut record = record_with_doi("1", "10.1000/xyz");
    run_chain(vec![Box::new(provider)], &mut record).await;

    assert_eq!(record.citation_count, 12);
    assert_eq!(record.citation_source, CitationSource::SemanticScholar);
}

#[tokio::test]
async fn test_semantic_scholar_failure_falls_back_to_crossref() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/paper/DOI:10.1000/xyz"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/works/10.1000/xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": {"is-referenced-by-count": 7}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetch = test_fetch_config();
    let provider = SemanticScholarProvider::new(test_client(), &fetch)
        .with_base_url(server.uri())
        .with_fallback(CrossrefWorks::new(test_client(), &fetch).with_base_url(server.uri()));

    let mut record = record_with_doi("1", "doi: 10.1000/xyz");
    run_chain(vec![Box::new(provider)], &mut record).await;

    assert_eq!(record.citation_count, 7);
    assert_eq!(record.citation_source, CitationSource::Crossref);
}

#[tokio::test]
async fn test_rate_limit_exhaustion_falls_through_to_icite() {
    let server = MockServer::start().await;

    // Semantic Scholar stays rate limited for the whole attempt budget,
    // which yields no answer rather than a Crossref fallback.
    Mock::given(method("GET"))
        .and(path("/paper/DOI:10.1000/xyz"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pubs/55"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"pmid": 55, "citation_count": 4}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetch = test_fetch_config();
    let semantic = SemanticScholarProvider::new(test_client(), &fetch)
        .with_base_url(server.uri())
        .with_fallback(CrossrefWorks::new(test_client(), &fetch).with_base_url(server.uri()));
    let icite = ICiteProvider::new(test_client(), &fetch)
        .with_base_url(format!("{}/api/pubs", server.uri()));

    let mut record = record_with_doi("55", "10.1000/xyz");
    run_chain(vec![Box::new(semantic), Box::new(icite)], &mut record).await;

    assert_eq!(record.citation_count, 4);
    assert_eq!(record.citation_source, CitationSource::Icite);
}

#[tokio::test]
async fn test_icite_zero_is_an_answer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/pubs/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"pmid": 9, "citation_count": 0}
        })))
        .mount(&server)
        .await;

    let fetch = test_fetch_config();
    let icite = ICiteProvider::new(test_client(), &fetch)
        .with_base_url(format!("{}/api/pubs", server.uri()));

    let mut record = ArticleRecord::new("9");
    run_chain(vec![Box::new(icite)], &mut record).await;

    assert_eq!(record.citation_count, 0);
    assert_eq!(record.citation_source, CitationSource::Icite);
}

#[tokio::test]
async fn test_title_search_uses_title_and_first_author_surname() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/paper/search"))
        .and(query_param("query", "Foo Bar Smith"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total": 1,
            "data": [{"paperId": "abc", "citationCount": 3}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetch = test_fetch_config();
    let title_search =
        TitleSearchProvider::new(test_client(), &fetch).with_base_url(server.uri());

    let mut record = ArticleRecord::new("");
    record.title = "Foo Bar".to_string();
    record.authors = vec!["Jane Smith".to_string()];
    run_chain(vec![Box::new(title_search)], &mut record).await;

    assert_eq!(record.citation_count, 3);
    assert_eq!(record.citation_source, CitationSource::TitleSearch);
}

#[tokio::test]
async fn test_no_hits_anywhere_tags_record_as_unresolved() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/paper/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"total": 0, "data": []})),
        )
        .mount(&server)
        .await;

    let fetch = test_fetch_config();
    // DOI and PMID are both empty, so only the title search applies.
    let semantic = SemanticScholarProvider::new(test_client(), &fetch)
        .with_base_url(server.uri())
        .with_fallback(CrossrefWorks::new(test_client(), &fetch).with_base_url(server.uri()));
    let icite = ICiteProvider::new(test_client(), &fetch)
        .with_base_url(format!("{}/api/pubs", server.uri()));
    let title_search =
        TitleSearchProvider::new(test_client(), &fetch).with_base_url(server.uri());

    let mut record = ArticleRecord::new("");
    record.title = "Foo Bar".to_string();
    record.authors = vec!["Jane Smith".to_string()];
    run_chain(
        vec![Box::new(semantic), Box::new(icite), Box::new(title_search)],
        &mut record,
    )
    .await;

    assert_eq!(record.citation_count, 0);
    assert_eq!(record.citation_source, CitationSource::None);
}

#[tokio::test]
async fn test_enrich_overwrites_previous_counts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/paper/DOI:10.1000/xyz"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"citationCount": 20})),
        )
        .mount(&server)
        .await;

    let fetch = test_fetch_config();
    let provider = SemanticScholarProvider::new(test_client(), &fetch)
        .with_base_url(server.uri())
        .with_fallback(CrossrefWorks::new(test_client(), &fetch).with_base_url(server.uri()));

    let mut record = record_with_doi("1", "10.1000/xyz");
    record.citation_count = 5;
    record.citation_source = CitationSource::Crossref;
    run_chain(vec![Box::new(provider)], &mut record).await;

    assert_eq!(record.citation_count, 20);
    assert_eq!(record.citation_source, CitationSource::SemanticScholar);
}
