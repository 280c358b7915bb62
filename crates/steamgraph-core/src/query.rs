//! # Query Mapper
//!
//! Translates each supported read operation into a graph [`Pattern`] and
//! reshapes the bound rows into response records.
//!
//! - Optional traversals that bind null become empty lists, never nulls
//! - Multi-branch patterns are de-duplicated by projection
//! - Ranking and ordering rules are applied here, not in storage
//!
//! The mapper never mutates the graph.

use crate::graph::GraphStore;
use crate::pattern::{Hop, NodeMatch, Pattern, Row};
use crate::primitives::{
    MAX_QUERY_LIMIT, PROP_ESTIMATED_OWNERS, PROP_NAME, PROP_PRICE, PROP_RELEASE_DATE,
    PROP_REQUIRED_AGE, SIMILAR_GAMES_LIMIT,
};
use crate::{GraphError, Label, Node, RelType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// RESPONSE RECORDS
// =============================================================================

/// Scalar attributes of a Game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: String,
    pub name: String,
    pub release_date: String,
    pub estimated_owners: u64,
    pub required_age: u64,
    pub price: f64,
}

impl GameSummary {
    /// Project a Game node. Missing attributes take their defaults.
    #[must_use]
    pub fn from_node(node: &Node) -> Self {
        Self {
            id: node.key.clone(),
            name: node.text(PROP_NAME).unwrap_or_default().to_string(),
            release_date: node.text(PROP_RELEASE_DATE).unwrap_or_default().to_string(),
            estimated_owners: node.integer(PROP_ESTIMATED_OWNERS).unwrap_or(0),
            required_age: node.integer(PROP_REQUIRED_AGE).unwrap_or(0),
            price: node.float(PROP_PRICE).unwrap_or(0.0),
        }
    }
}

/// A Game with the distinct names of everything linked to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetail {
    #[serde(flatten)]
    pub game: GameSummary,
    pub publishers: Vec<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
}

/// One entry of the similar-games ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarGame {
    pub name: String,
    /// Number of distinct tags shared with the source game.
    pub score: usize,
}

/// Games of one publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherGames {
    pub publisher: String,
    pub games: Vec<GameSummary>,
}

/// Games of one category (genre).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGames {
    pub category: String,
    pub games: Vec<GameSummary>,
}

// =============================================================================
// QUERY MAPPER
// =============================================================================

/// Validate a caller-supplied limit: zero is rejected, large values clamped.
pub fn clamp_limit(limit: usize) -> Result<usize, GraphError> {
    if limit == 0 {
        return Err(GraphError::InvalidArgument(
            "limit must be a positive integer".to_string(),
        ));
    }
    Ok(limit.min(MAX_QUERY_LIMIT))
}

/// The QueryMapper answers the read API.
pub struct QueryMapper;

impl QueryMapper {
    /// Up to `limit` games in storage-default order.
    pub fn list_games<G: GraphStore + ?Sized>(
        graph: &G,
        limit: usize,
    ) -> Result<Vec<GameSummary>, GraphError> {
        let limit = clamp_limit(limit)?;
        let pattern = Pattern::start(NodeMatch::new("g", Label::Game)).limit(limit);
        Ok(graph
            .execute(&pattern)?
            .iter()
            .filter_map(|row| row.get("g"))
            .map(GameSummary::from_node)
            .collect())
    }

    /// Full attributes of one game plus the names it links to.
    ///
    /// Each name list is distinct and sorted; a game without tags yields
    /// `tags: []`.
    pub fn game_detail<G: GraphStore + ?Sized>(
        graph: &G,
        id: &str,
    ) -> Result<GameDetail, GraphError> {
        let pattern = Pattern::start(NodeMatch::new("g", Label::Game).key(id))
            .optional_path(vec![Hop::incoming(RelType::Published, "p")])
            .optional_path(vec![Hop::outgoing(RelType::HasGenre, "ge")])
            .optional_path(vec![Hop::outgoing(RelType::HasTag, "t")]);
        let rows = graph.execute(&pattern)?;

        let game = rows
            .first()
            .and_then(|row| row.get("g"))
            .ok_or_else(|| GraphError::not_found(Label::Game, id))?;

        Ok(GameDetail {
            game: GameSummary::from_node(game),
            publishers: distinct_keys(&rows, "p"),
            genres: distinct_keys(&rows, "ge"),
            tags: distinct_keys(&rows, "t"),
        })
    }

    /// Other games sharing at least one tag with `id`, ranked by the number
    /// of distinct shared tags.
    ///
    /// Ties keep storage-default order. An unknown `id` yields an empty list.
    pub fn similar_games<G: GraphStore + ?Sized>(
        graph: &G,
        id: &str,
    ) -> Result<Vec<SimilarGame>, GraphError> {
        let pattern = Pattern::start(NodeMatch::new("g", Label::Game).key(id)).path(vec![
            Hop::outgoing(RelType::HasTag, "t"),
            Hop::incoming(RelType::HasTag, "other"),
        ]);

        let rows = graph.execute(&pattern)?;

        // other node id -> (node, shared tag ids)
        let mut shared: BTreeMap<_, (&Node, BTreeSet<_>)> = BTreeMap::new();
        for row in &rows {
            let (Some(other), Some(tag)) = (row.get("other"), row.get("t")) else {
                continue;
            };
            shared
                .entry(other.id)
                .or_insert_with(|| (other, BTreeSet::new()))
                .1
                .insert(tag.id);
        }

        let mut ranked: Vec<SimilarGame> = shared
            .into_values()
            .map(|(node, tags)| SimilarGame {
                name: node.text(PROP_NAME).unwrap_or_default().to_string(),
                score: tags.len(),
            })
            .collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(SIMILAR_GAMES_LIMIT);
        Ok(ranked)
    }

    /// Games of the publisher whose name matches `name` ignoring case,
    /// ordered by game name.
    pub fn games_by_publisher<G: GraphStore + ?Sized>(
        graph: &G,
        name: &str,
        limit: usize,
    ) -> Result<PublisherGames, GraphError> {
        let (publisher, games) =
            Self::games_linked_to(graph, Label::Publisher, RelType::Published, name, limit)?;
        Ok(PublisherGames { publisher, games })
    }

    /// Games of the genre whose name matches `name` ignoring case, ordered
    /// by game name.
    pub fn games_by_category<G: GraphStore + ?Sized>(
        graph: &G,
        name: &str,
        limit: usize,
    ) -> Result<CategoryGames, GraphError> {
        let (category, games) =
            Self::games_linked_to(graph, Label::Genre, RelType::HasGenre, name, limit)?;
        Ok(CategoryGames { category, games })
    }

    /// Shared body of the by-publisher and by-category lookups.
    ///
    /// Returns the stored name of the first matching entity and the distinct
    /// games linked to any matching entity.
    fn games_linked_to<G: GraphStore + ?Sized>(
        graph: &G,
        label: Label,
        rel: RelType,
        name: &str,
        limit: usize,
    ) -> Result<(String, Vec<GameSummary>), GraphError> {
        let limit = clamp_limit(limit)?;
        let hop = if rel == RelType::Published {
            Hop::outgoing(rel, "g")
        } else {
            Hop::incoming(rel, "g")
        };
        let pattern = Pattern::start(NodeMatch::new("e", label).key_ignore_case(name))
            .optional_path(vec![hop]);
        let rows = graph.execute(&pattern)?;

        let canonical = rows
            .first()
            .and_then(|row| row.get("e"))
            .map(|entity| entity.key.clone())
            .ok_or_else(|| GraphError::not_found(label, name))?;

        let mut games: BTreeMap<_, GameSummary> = BTreeMap::new();
        for game in rows.iter().filter_map(|row| row.get("g")) {
            games
                .entry(game.id)
                .or_insert_with(|| GameSummary::from_node(game));
        }

        let mut games: Vec<GameSummary> = games.into_values().collect();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        games.truncate(limit);
        Ok((canonical, games))
    }
}

/// Distinct, non-empty keys bound to `alias` across rows, sorted.
fn distinct_keys(rows: &[Row], alias: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(alias))
        .map(|node| node.key.as_str())
        .filter(|key| !key.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::normalize::NormalizedRecord;
    use crate::upsert::UpsertEngine;

    fn add(graph: &mut Graph, id: &str, name: &str, publishers: &[&str], tags: &[&str]) {
        let record = NormalizedRecord {
            identity: id.to_string(),
            name: name.to_string(),
            release_date: "2020".to_string(),
            estimated_owners: 100,
            required_age: 0,
            price: 4.99,
            publishers: publishers.iter().map(|s| s.to_string()).collect(),
            genres: vec!["Action".to_string()],
            tags: tags.iter().map(|s| s.to_string()).collect(),
        };
        UpsertEngine::upsert(graph, &record).expect("upsert");
    }

    fn sample() -> Graph {
        let mut graph = Graph::new();
        add(&mut graph, "1", "Source", &["Valve"], &["FPS", "Co-op", "Sci-fi"]);
        add(&mut graph, "2", "Zeta", &["Valve"], &["FPS"]);
        add(&mut graph, "3", "Alpha", &["Valve"], &["FPS", "Co-op"]);
        add(&mut graph, "4", "Lonely", &[], &[]);
        graph
    }

    #[test]
    fn list_games_in_storage_order() {
        let graph = sample();
        let games = QueryMapper::list_games(&graph, 2).expect("list");
        let ids: Vec<_> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(games[0].price, 4.99);
    }

    #[test]
    fn list_games_rejects_zero_limit() {
        let graph = sample();
        let result = QueryMapper::list_games(&graph, 0);
        assert!(matches!(result, Err(GraphError::InvalidArgument(_))));
    }

    #[test]
    fn clamp_limit_caps_large_values() {
        assert_eq!(clamp_limit(5).expect("valid"), 5);
        assert_eq!(clamp_limit(1_000_000).expect("valid"), MAX_QUERY_LIMIT);
    }

    #[test]
    fn detail_collects_distinct_names() {
        let graph = sample();
        let detail = QueryMapper::game_detail(&graph, "1").expect("detail");
        assert_eq!(detail.game.name, "Source");
        assert_eq!(detail.publishers, vec!["Valve"]);
        assert_eq!(detail.genres, vec!["Action"]);
        assert_eq!(detail.tags, vec!["Co-op", "FPS", "Sci-fi"]);
    }

    #[test]
    fn detail_without_links_has_empty_lists() {
        let graph = sample();
        let detail = QueryMapper::game_detail(&graph, "4").expect("detail");
        assert!(detail.tags.is_empty());
        assert!(detail.publishers.is_empty());
    }

    #[test]
    fn detail_unknown_is_not_found() {
        let graph = sample();
        let result = QueryMapper::game_detail(&graph, "999");
        assert!(matches!(result, Err(GraphError::NotFound { .. })));
    }

    #[test]
    fn similar_games_ranked_by_shared_tags() {
        let graph = sample();
        let similar = QueryMapper::similar_games(&graph, "1").expect("similar");
        assert_eq!(
            similar,
            vec![
                SimilarGame {
                    name: "Alpha".into(),
                    score: 2
                },
                SimilarGame {
                    name: "Zeta".into(),
                    score: 1
                },
            ]
        );
    }

    #[test]
    fn similar_games_unknown_source_is_empty() {
        let graph = sample();
        assert!(QueryMapper::similar_games(&graph, "999")
            .expect("similar")
            .is_empty());
    }

    #[test]
    fn similar_games_capped_at_ten() {
        let mut graph = Graph::new();
        add(&mut graph, "src", "Source", &[], &["Indie"]);
        for i in 0..15 {
            add(&mut graph, &format!("g{i}"), &format!("Game {i}"), &[], &["Indie"]);
        }
        let similar = QueryMapper::similar_games(&graph, "src").expect("similar");
        assert_eq!(similar.len(), SIMILAR_GAMES_LIMIT);
        // All tied: storage-default order.
        assert_eq!(similar[0].name, "Game 0");
    }

    #[test]
    fn publisher_lookup_ignores_case_and_sorts_by_name() {
        let graph = sample();
        let result = QueryMapper::games_by_publisher(&graph, "valve", 50).expect("publisher");
        assert_eq!(result.publisher, "Valve");
        let names: Vec<_> = result.games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Source", "Zeta"]);
    }

    #[test]
    fn publisher_limit_applies_after_ordering() {
        let graph = sample();
        let result = QueryMapper::games_by_publisher(&graph, "VALVE", 1).expect("publisher");
        assert_eq!(result.games.len(), 1);
        assert_eq!(result.games[0].name, "Alpha");
    }

    #[test]
    fn unknown_publisher_is_not_found() {
        let graph = sample();
        let result = QueryMapper::games_by_publisher(&graph, "Nobody", 50);
        assert!(matches!(result, Err(GraphError::NotFound { .. })));
    }

    #[test]
    fn category_lookup_uses_genres() {
        let graph = sample();
        let result = QueryMapper::games_by_category(&graph, "action", 50).expect("category");
        assert_eq!(result.category, "Action");
        assert_eq!(result.games.len(), 4);
    }
}
