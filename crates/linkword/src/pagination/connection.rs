//! Page assembly for keyset-paginated lists.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{Cursored, PaginationError, encode};

/// A node paired with its cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge<N> {
    /// Cursor that resumes the list after this node.
    pub cursor: String,
    /// The node.
    pub node: N,
}

/// Describes how to fetch the next page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Cursor of the last edge on this page, when another page follows.
    pub cursor: Option<String>,
    /// Whether another page follows.
    pub has_next_page: bool,
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    /// Edges of this page; empty, never absent, when there are no results.
    pub edges: Vec<Edge<N>>,
    /// Paging descriptor.
    pub page_info: PageInfo,
}

impl<N> Connection<N> {
    /// Iterates over the nodes of the page.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

/// Builds a page from rows fetched with `limit + 1`.
///
/// When the extra row is present it is dropped and the page advertises a next
/// page whose cursor is that of the `limit`-th row.
///
/// # Errors
///
/// Returns a [`PaginationError`] if a row cannot be encoded under `key`.
#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn build_connection<N: Cursored>(
    rows: Vec<N>,
    limit: usize,
    key: &str,
) -> Result<Connection<N>, PaginationError> {
    let mut edges = rows
        .into_iter()
        .map(|node| Ok(Edge { cursor: encode(key, &node)?, node }))
        .collect::<Result<Vec<_>, PaginationError>>()?;

    let has_next_page = edges.len() > limit;
    edges.truncate(limit);

    let cursor = if has_next_page {
        edges.last().map(|edge| edge.cursor.clone())
    } else {
        None
    };

    debug!(edges = edges.len(), has_next_page, "Connection built");
    Ok(Connection {
        edges,
        page_info: PageInfo {
            cursor,
            has_next_page,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{Accessor, SortValue, decode};

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Item(u64);

    impl Cursored for Item {
        const SORT_KEYS: &'static [(&'static str, Accessor<Self>)] =
            &[("rank", |item: &Item| Some(SortValue::Unsigned(item.0)))];
    }

    fn items(n: u64) -> Vec<Item> {
        (1..=n).map(Item).collect()
    }

    #[test]
    fn test_extra_row_signals_next_page() {
        let page = build_connection(items(4), 3, "rank").unwrap();
        assert_eq!(page.edges.len(), 3);
        assert!(page.page_info.has_next_page);
        let cursor = page.page_info.cursor.clone().unwrap();
        assert_eq!(cursor, page.edges[2].cursor);
        assert_eq!(decode(&cursor).unwrap(), "3");
    }

    #[test]
    fn test_short_page_has_no_next_cursor() {
        for n in 0..=3 {
            let page = build_connection(items(n), 3, "rank").unwrap();
            assert_eq!(page.edges.len(), n as usize);
            assert!(!page.page_info.has_next_page);
            assert_eq!(page.page_info.cursor, None);
        }
    }

    #[test]
    fn test_empty_page_serializes_empty_edges() {
        let page = build_connection(Vec::<Item>::new(), 10, "rank").unwrap();
        let json = serde_json::to_value(&page.edges).unwrap();
        assert_eq!(json, serde_json::json!([]));
    }

    #[test]
    fn test_bad_key_propagates() {
        assert!(matches!(
            build_connection(items(2), 5, "nope"),
            Err(PaginationError::InvalidKey(_))
        ));
    }
}
