//! Abaqus input-file reader: nodes and element connectivity.
//!
//! Only the `*NODE` and `*ELEMENT` keywords are interpreted; every other
//! keyword is skipped. Reading stops at a `*****` line, which the
//! element-set writer also uses as its terminator.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StrataError};

pub type NodeId = u64;
pub type ElementId = u64;

/// A mesh node. `position` is `[x, y, z]`; z is the vertical coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: [f64; 3],
}

impl Node {
    pub fn new(id: NodeId, x: f64, y: f64, z: f64) -> Self {
        Self { id, position: [x, y, z] }
    }

    #[inline]
    pub fn horizontal(&self) -> [f64; 2] {
        [self.position[0], self.position[1]]
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.position[2]
    }
}

/// An element and its connectivity. Node order is irrelevant to classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub nodes: Vec<NodeId>,
}

impl Element {
    pub fn new(id: ElementId, nodes: Vec<NodeId>) -> Self {
        Self { id, nodes }
    }
}

/// The elements of one `*ELEMENT` keyword.
#[derive(Debug, Clone, Default)]
pub struct ElementBlock {
    pub elset: Option<String>,
    pub element_type: Option<String>,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub nodes: Vec<Node>,
    pub blocks: Vec<ElementBlock>,
}

impl Mesh {
    /// Build a mesh holding a single anonymous element block.
    pub fn from_parts(nodes: Vec<Node>, elements: Vec<Element>) -> Self {
        Self {
            nodes,
            blocks: vec![ElementBlock { elset: None, element_type: None, elements }],
        }
    }

    /// All loaded elements in file order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.blocks.iter().flat_map(|b| b.elements.iter())
    }

    pub fn element_ids(&self) -> Vec<ElementId> {
        self.elements().map(|e| e.id).collect()
    }

    pub fn element_count(&self) -> usize {
        self.blocks.iter().map(|b| b.elements.len()).sum()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Which element blocks to load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshFilter {
    /// Load shell blocks (`TYPE=S3*` / `TYPE=S4*`) as well.
    #[serde(default)]
    pub include_2d_elements: bool,
    /// ELSET names whose blocks are skipped.
    #[serde(default)]
    pub excluded_elsets: Vec<String>,
}

impl MeshFilter {
    fn excludes(&self, block: &ElementBlock) -> Option<&'static str> {
        if let Some(name) = &block.elset {
            if self.excluded_elsets.iter().any(|e| e.eq_ignore_ascii_case(name)) {
                return Some("user-defined exclusion");
            }
        }
        if !self.include_2d_elements {
            if let Some(ty) = &block.element_type {
                let ty = ty.to_ascii_uppercase();
                if ty.starts_with("S3") || ty.starts_with("S4") {
                    return Some("2D elements");
                }
            }
        }
        None
    }
}

// ── Reader ────────────────────────────────────────────────────────────────────

pub fn read_abaqus(path: &Path, filter: &MeshFilter) -> Result<Mesh> {
    let text = fs::read_to_string(path).map_err(|e| StrataError::io(path, e))?;
    parse_abaqus(&text, path, filter)
}

enum Section {
    Other,
    Nodes,
    Elements(ElementBlock),
}

/// Parse the node and element sections of an Abaqus input deck.
///
/// `source` is only used in error messages.
pub fn parse_abaqus(text: &str, source: &Path, filter: &MeshFilter) -> Result<Mesh> {
    let mut mesh = Mesh::default();
    let mut section = Section::Other;
    // Values of an element whose data line ended with a comma.
    let mut pending: Vec<NodeId> = Vec::new();
    let mut pending_line = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("*****") {
            break;
        }
        if line.starts_with("**") {
            continue;
        }

        if line.starts_with('*') {
            if !pending.is_empty() {
                let values = std::mem::take(&mut pending);
                push_element(&mut section, values, source, pending_line)?;
            }
            close_section(&mut mesh, std::mem::replace(&mut section, Section::Other), filter);
            section = open_section(line);
            continue;
        }

        match section {
            Section::Other => {}
            Section::Nodes => mesh.nodes.push(parse_node(line, source, line_no)?),
            Section::Elements(_) => {
                if pending.is_empty() {
                    pending_line = line_no;
                }
                for token in tokens(line) {
                    pending.push(parse_id(token, source, line_no)?);
                }
                if !line.ends_with(',') {
                    let values = std::mem::take(&mut pending);
                    push_element(&mut section, values, source, pending_line)?;
                }
            }
        }
    }

    if !pending.is_empty() {
        push_element(&mut section, pending, source, pending_line)?;
    }
    close_section(&mut mesh, section, filter);

    if mesh.nodes.is_empty() {
        return Err(StrataError::MeshFormat {
            file: source.to_path_buf(),
            line: 0,
            message: "no *NODE section found".into(),
        });
    }

    info!(
        nodes = mesh.node_count(),
        elements = mesh.element_count(),
        blocks = mesh.blocks.len(),
        "mesh loaded from {}",
        source.display()
    );
    Ok(mesh)
}

fn open_section(keyword_line: &str) -> Section {
    let upper = keyword_line.to_ascii_uppercase();
    if upper.starts_with("*NODE") && !upper.starts_with("*NODE OUTPUT") && !upper.starts_with("*NODE PRINT") {
        Section::Nodes
    } else if upper.starts_with("*ELEM") && !upper.starts_with("*ELEMENT OUTPUT") {
        Section::Elements(ElementBlock {
            elset: keyword_parameter(keyword_line, "ELSET"),
            element_type: keyword_parameter(keyword_line, "TYPE"),
            elements: Vec::new(),
        })
    } else {
        Section::Other
    }
}

fn close_section(mesh: &mut Mesh, section: Section, filter: &MeshFilter) {
    let Section::Elements(block) = section else {
        return;
    };
    let name = block.elset.clone().unwrap_or_else(|| "<unnamed>".into());
    if let Some(reason) = filter.excludes(&block) {
        warn!("{name}: not loaded ({reason})");
        return;
    }
    debug!(elements = block.elements.len(), "{name}: elements loaded");
    mesh.blocks.push(block);
}

/// Value of `KEY=value` in a keyword line, case-insensitive on the key.
fn keyword_parameter(keyword_line: &str, key: &str) -> Option<String> {
    keyword_line.split(',').skip(1).find_map(|part| {
        let (k, v) = part.split_once('=')?;
        k.trim().eq_ignore_ascii_case(key).then(|| v.trim().to_string())
    })
}

fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty())
}

fn parse_id(token: &str, source: &Path, line: usize) -> Result<u64> {
    token.parse::<u64>().map_err(|_| mesh_error(source, line, format!("'{token}' is not a valid id")))
}

fn parse_node(line: &str, source: &Path, line_no: usize) -> Result<Node> {
    let values: Vec<&str> = tokens(line).collect();
    if values.len() < 4 {
        return Err(mesh_error(source, line_no, "node line needs an id and three coordinates".into()));
    }
    let id = parse_id(values[0], source, line_no)?;
    let mut position = [0.0f64; 3];
    for (slot, token) in position.iter_mut().zip(&values[1..4]) {
        *slot = token
            .parse::<f64>()
            .map_err(|_| mesh_error(source, line_no, format!("'{token}' is not a valid coordinate")))?;
    }
    Ok(Node { id, position })
}

fn push_element(section: &mut Section, values: Vec<u64>, source: &Path, line: usize) -> Result<()> {
    let Section::Elements(block) = section else {
        return Ok(());
    };
    if values.len() < 4 {
        return Err(mesh_error(source, line, "element needs an id and at least three nodes".into()));
    }
    block.elements.push(Element { id: values[0], nodes: values[1..].to_vec() });
    Ok(())
}

fn mesh_error(source: &Path, line: usize, message: String) -> StrataError {
    StrataError::MeshFormat { file: PathBuf::from(source), line, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = "\
*HEADING
test deck
*NODE
1, 0.0, 0.0, -1.0
2, 1.0, 0.0, -1.0
3, 1.0, 1.0, -1.0
4, 0.0, 1.0, -1.0
5, 0.0, 0.0, -2.0
6, 1.0, 0.0, -2.0
7, 1.0, 1.0, -2.0
8, 0.0, 1.0, -2.0
*ELEMENT, TYPE=C3D8, ELSET=Rock
10, 1, 2, 3, 4,
   5, 6, 7, 8
11, 5, 6, 7, 8, 1, 2, 3, 4
*ELEMENT, TYPE=S4R, ELSET=Surface
20, 1, 2, 3, 4
*ELEMENT, TYPE=C3D4, ELSET=Fault
30, 1, 2, 3, 5
*****
*ELEMENT, TYPE=C3D4, ELSET=AfterEnd
40, 1, 2, 3, 5
";

    fn parse(filter: &MeshFilter) -> Mesh {
        parse_abaqus(DECK, Path::new("deck.inp"), filter).unwrap()
    }

    #[test]
    fn continuation_lines_join_into_one_element() {
        let mesh = parse(&MeshFilter::default());
        assert_eq!(mesh.node_count(), 8);
        let first = mesh.elements().next().unwrap();
        assert_eq!(first.id, 10);
        assert_eq!(first.nodes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn shell_blocks_skipped_unless_requested() {
        let mesh = parse(&MeshFilter::default());
        assert_eq!(mesh.element_ids(), vec![10, 11, 30]);

        let with_2d = parse(&MeshFilter { include_2d_elements: true, ..Default::default() });
        assert_eq!(with_2d.element_ids(), vec![10, 11, 20, 30]);
    }

    #[test]
    fn excluded_elsets_are_not_loaded() {
        let filter = MeshFilter { include_2d_elements: false, excluded_elsets: vec!["fault".into()] };
        let mesh = parse(&filter);
        assert_eq!(mesh.element_ids(), vec![10, 11]);
        assert_eq!(mesh.blocks[0].elset.as_deref(), Some("Rock"));
        assert_eq!(mesh.blocks[0].element_type.as_deref(), Some("C3D8"));
    }

    #[test]
    fn reading_stops_at_terminator() {
        let mesh = parse(&MeshFilter { include_2d_elements: true, ..Default::default() });
        assert!(mesh.elements().all(|e| e.id != 40));
    }

    #[test]
    fn bad_coordinate_reports_line() {
        let deck = "*NODE\n1, 0.0, 0.0, 0.0\n2, 1.0, abc, 0.0\n";
        let err = parse_abaqus(deck, Path::new("bad.inp"), &MeshFilter::default()).unwrap_err();
        match err {
            StrataError::MeshFormat { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn deck_without_nodes_is_rejected() {
        let deck = "*ELEMENT, TYPE=C3D4, ELSET=A\n1, 1, 2, 3, 4\n";
        assert!(parse_abaqus(deck, Path::new("empty.inp"), &MeshFilter::default()).is_err());
    }
}
