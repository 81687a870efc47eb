//! Tiler options.

use super::pattern::TilePattern;
use crate::document::{DataType, Node};
use crate::mesh_error::MeshError;
use serde::Deserialize;

/// Axis-aligned box `xmin, xmax, ymin, ymax, zmin, zmax`.
pub type Extents = [f64; 6];

/// This domain's grid coordinate within a `domains` grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Decomposition {
    pub domain: [i64; 3],
    pub domains: [i64; 3],
}

impl Decomposition {
    pub fn num_domains(&self) -> i64 {
        self.domains.iter().product()
    }
}

/// Integer width of emitted connectivity and sizes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum IndexType {
    Int32,
    #[default]
    Native,
}

impl IndexType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "int" | "int32" | "integer" => IndexType::Int32,
            _ => IndexType::Native,
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            IndexType::Int32 => DataType::Int32,
            IndexType::Native => DataType::Int64,
        }
    }
}

impl<'de> Deserialize<'de> for IndexType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        Ok(IndexType::from_name(&name))
    }
}

fn default_true() -> bool {
    true
}

/// `extents` that are not 6 numbers are ignored, as in [`TilerOptions::from_node`].
fn lenient_extents<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<Extents>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    let extents = value
        .clone()
        .and_then(|v| serde_json::from_value::<Extents>(v).ok());
    if value.is_some_and(|v| !v.is_null()) && extents.is_none() {
        log::debug!("ignoring `extents`: expected 6 numbers");
    }
    Ok(extents)
}

/// Options accepted by [`Tiler::generate`](super::Tiler::generate).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TilerOptions {
    /// Pattern override.
    #[serde(default)]
    pub tile: Option<TilePattern>,
    /// Reorder elements spatially.
    #[serde(default = "default_true")]
    pub reorder: bool,
    #[serde(default, rename = "datatype")]
    pub index_type: IndexType,
    #[serde(default, deserialize_with = "lenient_extents")]
    pub extents: Option<Extents>,
    #[serde(default, flatten)]
    pub decomposition: Option<Decomposition>,
    /// Emit `nodeids`, `dist` and `elemids` fields.
    #[serde(default)]
    pub fields: bool,
}

impl Default for TilerOptions {
    fn default() -> Self {
        Self {
            tile: None,
            reorder: true,
            index_type: IndexType::Native,
            extents: None,
            decomposition: None,
            fields: false,
        }
    }
}

fn fixed<const N: usize>(node: &Node, key: &str) -> Option<[f64; N]> {
    let values = node.fetch(key)?.as_array()?.to_f64_vec();
    <[f64; N]>::try_from(values).ok()
}

fn flag(node: &Node, key: &str) -> Option<bool> {
    node.fetch(key).and_then(Node::to_i64).map(|v| v > 0)
}

impl TilerOptions {
    /// Read options from a document. Wrongly shaped `extents` or
    /// `domain`/`domains` are ignored.
    pub fn from_node(options: &Node) -> Result<Self, MeshError> {
        let tile = options
            .fetch("tile")
            .map(TilePattern::from_node)
            .transpose()?;
        let index_type = options
            .fetch("datatype")
            .and_then(Node::as_str)
            .map(IndexType::from_name)
            .unwrap_or_default();
        let extents = fixed::<6>(options, "extents");
        if options.has_path("extents") && extents.is_none() {
            log::debug!("ignoring `extents`: expected 6 numbers");
        }
        let decomposition = match (fixed::<3>(options, "domain"), fixed::<3>(options, "domains")) {
            (Some(d), Some(ds)) => Some(Decomposition {
                domain: d.map(|v| v as i64),
                domains: ds.map(|v| v as i64),
            }),
            _ => None,
        };
        Ok(Self {
            tile,
            reorder: flag(options, "reorder").unwrap_or(true),
            index_type,
            extents,
            decomposition,
            fields: flag(options, "fields").unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = TilerOptions::from_node(&Node::new()).unwrap();
        assert_eq!(o, TilerOptions::default());
        assert!(o.reorder);
        assert_eq!(o.index_type.data_type(), DataType::Int64);
    }

    #[test]
    fn reads_every_key() {
        let n = Node::from_json(
            r#"{"reorder": 0, "datatype": "integer", "extents": [0, 1, 0, 2, 0, 3],
                "domain": [1, 0, 0], "domains": [2, 1, 1], "fields": 1}"#,
        )
        .unwrap();
        let o = TilerOptions::from_node(&n).unwrap();
        assert!(!o.reorder);
        assert!(o.fields);
        assert_eq!(o.index_type, IndexType::Int32);
        assert_eq!(o.extents, Some([0., 1., 0., 2., 0., 3.]));
        let d = o.decomposition.unwrap();
        assert_eq!(d.domain, [1, 0, 0]);
        assert_eq!(d.num_domains(), 2);
    }

    #[test]
    fn wrong_shapes_are_ignored() {
        let n = Node::from_json(r#"{"extents": [0, 1], "domain": [0, 0], "domains": [2, 2, 1]}"#)
            .unwrap();
        let o = TilerOptions::from_node(&n).unwrap();
        assert_eq!(o.extents, None);
        assert_eq!(o.decomposition, None);
    }

    #[test]
    fn native_for_unknown_datatype() {
        assert_eq!(IndexType::from_name("int64"), IndexType::Native);
        assert_eq!(IndexType::from_name("int"), IndexType::Int32);
    }

    #[test]
    fn deserializes_from_json() {
        let o: TilerOptions =
            serde_json::from_str(r#"{"reorder": false, "datatype": "int32"}"#).unwrap();
        assert!(!o.reorder);
        assert_eq!(o.index_type, IndexType::Int32);
        assert!(o.tile.is_none());
    }

    #[test]
    fn typed_extents_must_be_six_numbers() {
        let o: TilerOptions = serde_json::from_str(r#"{"extents": [0, 1]}"#).unwrap();
        assert_eq!(o.extents, None);
        let o: TilerOptions = serde_json::from_str(r#"{"extents": "wide"}"#).unwrap();
        assert_eq!(o.extents, None);
        let o: TilerOptions =
            serde_json::from_str(r#"{"extents": [0, 1, 0, 2, 0, 3.5]}"#).unwrap();
        assert_eq!(o.extents, Some([0., 1., 0., 2., 0., 3.5]));
    }
}
