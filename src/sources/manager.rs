use super::{
  deezer::DeezerSource,
  http::HttpSource,
  plugin::{BoxedSource, Query, TrackSource},
};
use crate::{common::CatalogError, protocol::tracks::Track};

/// Resolves user input into tracks through the registered sources.
pub struct TrackCatalog {
  pub sources: Vec<BoxedSource>,
  search_limit: usize,
}

impl TrackCatalog {
  /// Create a catalog with every source enabled in the config
  pub fn new(config: &crate::configs::Config) -> Self {
    let mut sources: Vec<BoxedSource> = Vec::new();

    macro_rules! register_source {
      ($enabled:expr, $name:literal, $ctor:expr) => {
        if $enabled {
          match $ctor {
            Ok(src) => {
              tracing::info!("Loaded source: {}", $name);
              sources.push(Box::new(src));
            }
            Err(e) => {
              tracing::error!("{} source failed to initialize: {}", $name, e);
            }
          }
        }
      };
    }

    register_source!(config.sources.http, "http", HttpSource::new());
    register_source!(
      config.sources.deezer,
      "Deezer",
      DeezerSource::new(config.sources.search_limit)
    );

    Self::with_sources(sources, config.sources.search_limit)
  }

  pub fn with_sources(sources: Vec<BoxedSource>, search_limit: usize) -> Self {
    Self {
      sources,
      search_limit: search_limit.max(1),
    }
  }

  pub fn register(&mut self, source: impl TrackSource + 'static) {
    tracing::info!("Loaded source: {}", source.name());
    self.sources.push(Box::new(source));
  }

  pub fn source_names(&self) -> Vec<&str> {
    self.sources.iter().map(|s| s.name()).collect()
  }

  /// Resolve a URL or search query using the first matching source.
  ///
  /// A link yields every track it points at (a playlist may be many); a
  /// search yields at most `search_limit` hits, best first.
  pub async fn resolve(&self, input: &str) -> Result<Vec<Track>, CatalogError> {
    let query = Query::parse(input).ok_or(CatalogError::EmptyQuery)?;

    let Some(source) = self.sources.iter().find(|s| s.can_handle(&query)) else {
      tracing::debug!("No source could handle query: {}", query);
      return Err(CatalogError::Unsupported(query.to_string()));
    };

    tracing::trace!("Resolving '{}' with source: {}", query, source.name());
    let mut tracks = source.resolve(&query).await?;

    if query.is_search() {
      tracks.truncate(self.search_limit);
    }

    if tracks.is_empty() {
      return Err(CatalogError::NotFound(query.to_string()));
    }

    tracing::debug!(
      "Resolved '{}' to {} track(s) via {}",
      query,
      tracks.len(),
      source.name()
    );
    Ok(tracks)
  }
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;

  use super::*;

  struct StaticSource {
    name: &'static str,
    search: bool,
    hits: usize,
  }

  #[async_trait]
  impl TrackSource for StaticSource {
    fn name(&self) -> &str {
      self.name
    }

    fn can_handle(&self, query: &Query) -> bool {
      query.is_search() == self.search
    }

    async fn resolve(&self, query: &Query) -> Result<Vec<Track>, CatalogError> {
      Ok(
        (0..self.hits)
          .map(|i| {
            Track::new(
              format!("https://example.com/{}/{}", self.name, i),
              format!("{} {}", query, i),
              "Artist",
              180,
            )
          })
          .collect(),
      )
    }
  }

  fn catalog() -> TrackCatalog {
    let sources: Vec<BoxedSource> = vec![
      Box::new(StaticSource {
        name: "links",
        search: false,
        hits: 12,
      }),
      Box::new(StaticSource {
        name: "search",
        search: true,
        hits: 12,
      }),
    ];
    TrackCatalog::with_sources(sources, 5)
  }

  #[tokio::test]
  async fn test_search_results_are_capped() {
    let tracks = catalog().resolve("lofi beats").await.unwrap();
    assert_eq!(tracks.len(), 5);
    assert_eq!(tracks[0].url, "https://example.com/search/0");
  }

  #[tokio::test]
  async fn test_links_return_everything() {
    let tracks = catalog()
      .resolve("https://example.com/playlist")
      .await
      .unwrap();
    assert_eq!(tracks.len(), 12);
  }

  #[tokio::test]
  async fn test_blank_input_is_rejected() {
    assert!(matches!(
      catalog().resolve("  ").await,
      Err(CatalogError::EmptyQuery)
    ));
  }

  #[test]
  fn test_default_config_covers_links_and_searches() {
    let catalog = TrackCatalog::new(&crate::configs::Config::default());
    assert_eq!(catalog.source_names(), vec!["http", "deezer"]);

    let search = Query::parse("never gonna give you up").unwrap();
    let link = Query::parse("https://example.com/a.mp3").unwrap();
    assert!(catalog.sources.iter().any(|s| s.can_handle(&search)));
    assert!(catalog.sources.iter().any(|s| s.can_handle(&link)));
  }

  #[tokio::test]
  async fn test_unhandled_and_empty() {
    let sources: Vec<BoxedSource> = vec![Box::new(StaticSource {
      name: "links",
      search: false,
      hits: 0,
    })];
    let only_links = TrackCatalog::with_sources(sources, 5);

    assert!(matches!(
      only_links.resolve("some song").await,
      Err(CatalogError::Unsupported(_))
    ));
    assert!(matches!(
      only_links.resolve("https://example.com/none").await,
      Err(CatalogError::NotFound(_))
    ));
  }
}
