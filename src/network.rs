//! Node and edge records read from the network tables.
//!
//! The node table carries precomputed layout coordinates and the attribute
//! columns that drive marker size and color. The edge table is a plain
//! list of directed `(source, target)` pairs.

use crate::error::Result;
use crate::table::{ColumnTable, Filter, TableSpec, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node identifier column.
pub const VALUE_COLUMN: &str = "_Value_";
/// Precomputed layout x coordinate.
pub const X_COLUMN: &str = "_AllXCoord_";
/// Precomputed layout y coordinate.
pub const Y_COLUMN: &str = "_AllYCoord_";
/// Community of a node.
pub const COMMUNITY_COLUMN: &str = "_Community_";
/// Community of an edge's source node.
pub const SOURCE_COMMUNITY_COLUMN: &str = "_SCommunity_";
/// Community of an edge's target node.
pub const TARGET_COMMUNITY_COLUMN: &str = "_TCommunity_";
pub const SOURCE_COLUMN: &str = "_Source_";
pub const TARGET_COLUMN: &str = "_Target_";

/// Smallest attribute value used for marker sizing.
pub const SIZE_FLOOR: f64 = 0.1;

/// Marker area for an attribute value. Values below the floor are raised
/// to it so no marker disappears.
pub fn marker_size(value: f64, multiplier: f64) -> f64 {
    value.max(SIZE_FLOOR) * multiplier
}

/// A node identifier in text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl From<&Value> for NodeId {
    fn from(value: &Value) -> Self {
        NodeId(value.to_key())
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the node table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    /// Raw value of the size attribute.
    pub size_value: f64,
    /// Raw value of the color attribute, when one was requested.
    pub color_value: Option<f64>,
}

impl NodeRecord {
    /// Read node rows. `color_attr` is only consulted when given.
    pub fn from_table(
        table: &ColumnTable,
        size_attr: &str,
        color_attr: Option<&str>,
    ) -> Result<Vec<NodeRecord>> {
        let ids = table.column(VALUE_COLUMN)?;
        let xs = table.numbers(X_COLUMN)?;
        let ys = table.numbers(Y_COLUMN)?;
        let sizes = table.numbers(size_attr)?;
        let colors = color_attr.map(|attr| table.numbers(attr)).transpose()?;

        Ok(ids
            .iter()
            .enumerate()
            .map(|(i, id)| NodeRecord {
                id: NodeId::from(id),
                x: xs[i],
                y: ys[i],
                size_value: sizes[i],
                color_value: colors.as_ref().map(|c| c[i]),
            })
            .collect())
    }
}

/// One row of the edge table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,
}

impl EdgeRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: NodeId(source.into()),
            target: NodeId(target.into()),
        }
    }

    /// Read edges in table order.
    pub fn from_table(table: &ColumnTable) -> Result<Vec<EdgeRecord>> {
        let sources = table.column(SOURCE_COLUMN)?;
        let targets = table.column(TARGET_COLUMN)?;

        Ok(sources
            .iter()
            .zip(targets)
            .map(|(s, t)| EdgeRecord {
                source: NodeId::from(s),
                target: NodeId::from(t),
            })
            .collect())
    }
}

/// Sorted, deduplicated color attribute values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunitySet(Vec<f64>);

impl CommunitySet {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.0.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.0.last().copied()
    }
}

/// Per-node visual attributes keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct NodeAttributes {
    pub positions: HashMap<NodeId, (f64, f64)>,
    pub sizes: HashMap<NodeId, f64>,
    pub colors: HashMap<NodeId, f64>,
    pub communities: CommunitySet,
}

impl NodeAttributes {
    /// Build the maps. A repeated id keeps its last row.
    pub fn from_records(records: &[NodeRecord], size_multiplier: f64) -> Self {
        let mut attrs = NodeAttributes::default();

        for record in records {
            attrs
                .positions
                .insert(record.id.clone(), (record.x, record.y));
            attrs.sizes.insert(
                record.id.clone(),
                marker_size(record.size_value, size_multiplier),
            );
            if let Some(color) = record.color_value {
                attrs.colors.insert(record.id.clone(), color);
            }
        }

        attrs.communities =
            CommunitySet::from_values(records.iter().filter_map(|r| r.color_value));
        attrs
    }
}

/// Names of the node and edge tables that make up one network.
///
/// Holds names only. Rows are fetched fresh on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTables {
    pub nodes: String,
    pub edges: String,
}

impl Default for NetworkTables {
    fn default() -> Self {
        Self {
            nodes: "nodes".to_string(),
            edges: "edges".to_string(),
        }
    }
}

impl NetworkTables {
    pub fn new(nodes: impl Into<String>, edges: impl Into<String>) -> Self {
        Self {
            nodes: nodes.into(),
            edges: edges.into(),
        }
    }

    /// Node table, restricted to one community when given.
    pub fn node_spec(&self, community: Option<i64>) -> TableSpec {
        let spec = TableSpec::new(&self.nodes);
        match community {
            Some(c) => spec.with_filter(Filter::eq(COMMUNITY_COLUMN, c)),
            None => spec,
        }
    }

    /// Edge table, restricted to edges inside one community when given.
    pub fn edge_spec(&self, community: Option<i64>) -> TableSpec {
        let spec = TableSpec::new(&self.edges);
        match community {
            Some(c) => spec.with_filter(
                Filter::eq(SOURCE_COMMUNITY_COLUMN, c).and(TARGET_COMMUNITY_COLUMN, c),
            ),
            None => spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_marker_size_floor() {
        assert_eq!(marker_size(0.0, 500.0), 50.0);
        assert_eq!(marker_size(-3.0, 500.0), 50.0);
        assert_eq!(marker_size(2.0, 500.0), 1000.0);
    }

    #[test]
    fn test_community_set_sorted_unique() {
        let set = CommunitySet::from_values([3.0, 1.0, 3.0, 2.0]);
        assert_eq!(set.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(set.min(), Some(1.0));
        assert_eq!(set.max(), Some(3.0));
    }

    #[test]
    fn test_node_records_from_table() {
        let mut columns = BTreeMap::new();
        columns.insert(VALUE_COLUMN.to_string(), vec![Value::from(1.0), "b".into()]);
        columns.insert(X_COLUMN.to_string(), vec![0.0.into(), 1.0.into()]);
        columns.insert(Y_COLUMN.to_string(), vec![0.5.into(), 1.5.into()]);
        columns.insert("_HypGrp_".to_string(), vec![0.0.into(), 2.0.into()]);
        columns.insert(COMMUNITY_COLUMN.to_string(), vec![4.0.into(), 4.0.into()]);
        let table = ColumnTable::from_columns("nodes", columns).unwrap();

        let records = NodeRecord::from_table(&table, "_HypGrp_", Some(COMMUNITY_COLUMN)).unwrap();
        assert_eq!(records[0].id, NodeId::from("1"));
        assert_eq!(records[1].color_value, Some(4.0));

        let attrs = NodeAttributes::from_records(&records, 500.0);
        assert_eq!(attrs.sizes[&NodeId::from("1")], 50.0);
        assert_eq!(attrs.positions[&NodeId::from("b")], (1.0, 1.5));
        assert_eq!(attrs.communities.values(), &[4.0]);
    }

    #[test]
    fn test_missing_size_column() {
        let mut columns = BTreeMap::new();
        columns.insert(VALUE_COLUMN.to_string(), vec![Value::from("a")]);
        columns.insert(X_COLUMN.to_string(), vec![0.0.into()]);
        columns.insert(Y_COLUMN.to_string(), vec![0.0.into()]);
        let table = ColumnTable::from_columns("nodes", columns).unwrap();

        assert!(NodeRecord::from_table(&table, "_HypGrp_", None).is_err());
    }

    #[test]
    fn test_specs_filter_by_community() {
        let tables = NetworkTables::default();
        assert!(tables.node_spec(None).filter.is_none());
        assert_eq!(
            tables.node_spec(Some(2)).filter.unwrap().to_string(),
            "_Community_ EQ 2"
        );
        assert_eq!(
            tables.edge_spec(Some(2)).filter.unwrap().to_string(),
            "_SCommunity_ EQ 2 AND _TCommunity_ EQ 2"
        );
    }

    proptest! {
        #[test]
        fn marker_size_scales_floored_value(v in -1e3f64..1e3, m in 0.0f64..1e3) {
            let size = marker_size(v, m);
            prop_assert_eq!(size, v.max(SIZE_FLOOR) * m);
            prop_assert!(size >= SIZE_FLOOR * m);
        }

        #[test]
        fn marker_size_monotonic_in_value(a in -1e3f64..1e3, b in -1e3f64..1e3, m in 0.0f64..1e3) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(marker_size(lo, m) <= marker_size(hi, m));
        }
    }
}
