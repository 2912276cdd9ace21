use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::time::Instant;

use log::{info, warn};

use crate::errors::{Error, Result};
use crate::gz_stream::open_dump;
use crate::utilities::split_dmp_line;

pub type TaxId = u64;

/// Taxon ID reported for records whose taxa could not be resolved.
pub const UNKNOWN_TAXID: TaxId = 0;
pub const UNKNOWN_NAME: &str = "unknown";
pub const NO_RANK: &str = "no rank";
/// Emitted by [`Taxonomy::at_levels`] for ranks missing from a lineage.
pub const UNCLASSIFIED: &str = "unclassified";

const NODES_MIN_FIELDS: usize = 3;
const NAMES_MIN_FIELDS: usize = 4;
const SCIENTIFIC_NAME: &str = "scientific name";
const UNSET_DEPTH: usize = usize::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyNode {
    pub taxon_id: TaxId,
    /// Equal to `taxon_id` for the root
    pub parent_id: TaxId,
    pub rank: String,
    pub scientific_name: String,
    /// Distance from the root, which has depth 0
    pub depth: usize,
    /// Position of the parent in `Taxonomy::nodes`
    parent: usize,
}

impl TaxonomyNode {
    /// True for the sentinel returned when no LCA could be computed.
    pub fn is_unknown(&self) -> bool {
        self.taxon_id == UNKNOWN_TAXID
    }
}

/// Taxonomy tree loaded from NCBI-style `nodes.dmp` / `names.dmp` files.
///
/// The tree is immutable once built and is shared by reference between
/// worker threads.
#[derive(Debug)]
pub struct Taxonomy {
    nodes: Vec<TaxonomyNode>,
    index: HashMap<TaxId, usize>,
    root: usize,
    unknown: TaxonomyNode,
}

impl Taxonomy {
    /// Loads the taxonomy from a nodes file and a names file.
    ///
    /// Files ending in `.gz` are decompressed on the fly.
    ///
    /// # Arguments
    ///
    /// * `nodes_filename` - The path to the nodes file.
    /// * `names_filename` - The path to the names file.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(
        nodes_filename: P,
        names_filename: Q,
    ) -> Result<Self> {
        let nodes_filename = nodes_filename.as_ref();
        let names_filename = names_filename.as_ref();
        let start = Instant::now();

        let nodes_reader = open_dump(nodes_filename)?;
        let names_reader = open_dump(names_filename)?;
        let taxonomy =
            Self::load(nodes_reader, nodes_filename, names_reader, names_filename)?;

        info!(
            "Loaded {} taxa from {} and {} in {:.3} seconds",
            taxonomy.len(),
            nodes_filename.display(),
            names_filename.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(taxonomy)
    }

    /// Builds the taxonomy from in-memory readers; errors name the sources `nodes` and `names`.
    pub fn from_readers<R: BufRead, S: BufRead>(nodes_reader: R, names_reader: S) -> Result<Self> {
        Self::load(
            nodes_reader,
            Path::new("nodes"),
            names_reader,
            Path::new("names"),
        )
    }

    fn load<R: BufRead, S: BufRead>(
        nodes_reader: R,
        nodes_path: &Path,
        names_reader: S,
        names_path: &Path,
    ) -> Result<Self> {
        let mut builder = TaxonomyBuilder::default();
        builder.read_nodes(nodes_reader, nodes_path)?;
        builder.read_names(names_reader, names_path)?;
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &TaxonomyNode {
        &self.nodes[self.root]
    }

    /// The sentinel node (taxon 0, "unknown"); it is never part of the tree.
    pub fn unknown(&self) -> &TaxonomyNode {
        &self.unknown
    }

    pub fn get(&self, taxon_id: TaxId) -> Option<&TaxonomyNode> {
        self.index.get(&taxon_id).map(|&i| &self.nodes[i])
    }

    /// Iterates from `node` up to the root, both inclusive.
    ///
    /// Yields nothing for a node that is not part of this taxonomy.
    pub fn lineage<'a>(&'a self, node: &TaxonomyNode) -> Lineage<'a> {
        Lineage {
            taxonomy: self,
            current: self.index.get(&node.taxon_id).copied(),
        }
    }

    /// Finds the lowest common ancestor of a collection of taxa.
    ///
    /// Taxa absent from the tree are ignored. The result only depends on the
    /// set of known taxa, not on their order.
    ///
    /// # Returns
    ///
    /// The common ancestor node, or [`Error::NoValidTaxa`] when none of the
    /// taxa are known.
    pub fn lca(&self, taxa: &[TaxId]) -> Result<&TaxonomyNode> {
        let mut known = taxa.iter().filter_map(|taxon| self.index.get(taxon).copied());
        let first = known.next().ok_or(Error::NoValidTaxa)?;
        let lca = known.fold(first, |a, b| self.lowest_common_ancestor(a, b));
        Ok(&self.nodes[lca])
    }

    /// Like [`Taxonomy::lca`], but falls back to the unknown sentinel.
    pub fn lca_or_unknown(&self, taxa: &[TaxId]) -> &TaxonomyNode {
        self.lca(taxa).unwrap_or(&self.unknown)
    }

    /// Projects `node` onto each requested rank.
    ///
    /// Every entry is the scientific name of the closest ancestor (or the node
    /// itself) carrying that rank, or [`UNCLASSIFIED`] when the lineage has no
    /// such rank. The output has one entry per requested rank, in order.
    pub fn at_levels<'a, S: AsRef<str>>(
        &'a self,
        node: &TaxonomyNode,
        ranks: &[S],
    ) -> Vec<&'a str> {
        ranks
            .iter()
            .map(|rank| {
                self.lineage(node)
                    .find(|ancestor| ancestor.rank == rank.as_ref())
                    .map(|ancestor| ancestor.scientific_name.as_str())
                    .unwrap_or(UNCLASSIFIED)
            })
            .collect()
    }

    fn lowest_common_ancestor(&self, a: usize, b: usize) -> usize {
        let (mut a, mut b) = (a, b);
        let (depth_a, depth_b) = (self.nodes[a].depth, self.nodes[b].depth);
        if depth_a > depth_b {
            a = self.walk_up(a, depth_a - depth_b);
        } else if depth_b > depth_a {
            b = self.walk_up(b, depth_b - depth_a);
        }

        while a != b {
            a = self.nodes[a].parent;
            b = self.nodes[b].parent;
        }
        a
    }

    fn walk_up(&self, mut node: usize, steps: usize) -> usize {
        for _ in 0..steps {
            node = self.nodes[node].parent;
        }
        node
    }
}

/// Iterator over a node and its ancestors, see [`Taxonomy::lineage`].
pub struct Lineage<'a> {
    taxonomy: &'a Taxonomy,
    current: Option<usize>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a TaxonomyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let node = &self.taxonomy.nodes[index];
        self.current = (index != self.taxonomy.root).then_some(node.parent);
        Some(node)
    }
}

#[derive(Default)]
struct RawNode {
    parent_id: TaxId,
    rank: String,
    name: Option<String>,
}

#[derive(Default)]
struct TaxonomyBuilder {
    nodes: Vec<(TaxId, RawNode)>,
    index: HashMap<TaxId, usize>,
}

impl TaxonomyBuilder {
    fn read_nodes<R: BufRead>(&mut self, reader: R, path: &Path) -> Result<()> {
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let line_no = line_no + 1;
            let fields = split_dmp_line(&line);
            if fields.len() < NODES_MIN_FIELDS {
                return Err(Error::parse(
                    path,
                    line_no,
                    format!(
                        "expected at least {} fields, found {}",
                        NODES_MIN_FIELDS,
                        fields.len()
                    ),
                ));
            }

            let taxon_id = parse_taxid(fields[0], path, line_no)?;
            let parent_id = parse_taxid(fields[1], path, line_no)?;
            let rank = fields[2].trim().to_string();

            let slot = match self.index.get(&taxon_id).copied() {
                Some(slot) => slot,
                None => {
                    self.nodes.push((taxon_id, RawNode::default()));
                    self.index.insert(taxon_id, self.nodes.len() - 1);
                    self.nodes.len() - 1
                }
            };
            let node = &mut self.nodes[slot].1;
            node.parent_id = parent_id;
            node.rank = rank;
        }
        Ok(())
    }

    fn read_names<R: BufRead>(&mut self, reader: R, path: &Path) -> Result<()> {
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let line_no = line_no + 1;
            let fields = split_dmp_line(&line);
            if fields.len() < NAMES_MIN_FIELDS {
                return Err(Error::parse(
                    path,
                    line_no,
                    format!(
                        "expected at least {} fields, found {}",
                        NAMES_MIN_FIELDS,
                        fields.len()
                    ),
                ));
            }

            let taxon_id = parse_taxid(fields[0], path, line_no)?;
            if fields[3].trim() != SCIENTIFIC_NAME {
                continue;
            }

            match self.index.get(&taxon_id) {
                Some(&slot) => self.nodes[slot].1.name = Some(fields[1].to_string()),
                None => warn!("Ignoring name for unknown taxon {}", taxon_id),
            }
        }
        Ok(())
    }

    fn build(self) -> Result<Taxonomy> {
        let count = self.nodes.len();

        let mut parents = Vec::with_capacity(count);
        let mut root: Option<usize> = None;
        for (slot, (taxon_id, raw)) in self.nodes.iter().enumerate() {
            let parent = *self
                .index
                .get(&raw.parent_id)
                .ok_or(Error::MissingParent {
                    taxon: *taxon_id,
                    parent: raw.parent_id,
                })?;
            if parent == slot {
                if let Some(existing) = root {
                    return Err(Error::MultipleRoots(self.nodes[existing].0, *taxon_id));
                }
                root = Some(slot);
            }
            parents.push(parent);
        }
        let root = root.ok_or(Error::NoRoot)?;

        let depths = compute_depths(&parents, root)
            .map_err(|slot| Error::Cycle(self.nodes[slot].0))?;

        let nodes = self
            .nodes
            .into_iter()
            .zip(parents.into_iter().zip(depths))
            .map(|((taxon_id, raw), (parent, depth))| TaxonomyNode {
                taxon_id,
                parent_id: raw.parent_id,
                rank: raw.rank,
                scientific_name: raw
                    .name
                    .unwrap_or_else(|| format!("Unnamed taxon {}", taxon_id)),
                depth,
                parent,
            })
            .collect();

        Ok(Taxonomy {
            nodes,
            index: self.index,
            root,
            unknown: TaxonomyNode {
                taxon_id: UNKNOWN_TAXID,
                parent_id: UNKNOWN_TAXID,
                rank: NO_RANK.to_string(),
                scientific_name: UNKNOWN_NAME.to_string(),
                depth: 0,
                parent: root,
            },
        })
    }
}

/// Computes every node's distance from `root`, visiting each node once.
///
/// Returns the slot of a node whose parent chain never reaches the root.
fn compute_depths(parents: &[usize], root: usize) -> std::result::Result<Vec<usize>, usize> {
    let mut depths = vec![UNSET_DEPTH; parents.len()];
    depths[root] = 0;

    let mut pending = Vec::new();
    for start in 0..parents.len() {
        let mut current = start;
        while depths[current] == UNSET_DEPTH {
            if pending.len() > parents.len() {
                return Err(start);
            }
            pending.push(current);
            current = parents[current];
        }

        let mut depth = depths[current];
        while let Some(slot) = pending.pop() {
            depth += 1;
            depths[slot] = depth;
        }
    }
    Ok(depths)
}

fn parse_taxid(field: &str, path: &Path, line_no: usize) -> Result<TaxId> {
    let field = field.trim();
    match field.parse::<TaxId>() {
        Ok(UNKNOWN_TAXID) => Err(Error::parse(path, line_no, "taxon ID 0 is reserved")),
        Ok(taxon_id) => Ok(taxon_id),
        Err(_) => Err(Error::parse(
            path,
            line_no,
            format!("invalid taxon ID {:?}", field),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    const NODES_DATA: &str = "1\t|\t1\t|\tno rank\t|\t\t|\t8\t|\t0\t|\t1\t|\t0\t|
2\t|\t1\t|\tsuperkingdom\t|\t\t|\t0\t|\t0\t|\t11\t|\t0\t|
3\t|\t2\t|\tphylum\t|\t\t|\t0\t|\t1\t|\t11\t|\t1\t|
4\t|\t3\t|\tgenus\t|\t\t|\t0\t|\t1\t|\t11\t|\t1\t|
5\t|\t4\t|\tspecies\t|\tEC\t|\t0\t|\t1\t|\t11\t|\t1\t|
6\t|\t4\t|\tspecies\t|\tEA\t|\t0\t|\t1\t|\t11\t|\t1\t|
7\t|\t3\t|\tgenus\t|\t\t|\t0\t|\t1\t|\t11\t|\t1\t|
8\t|\t1\t|\tsuperkingdom\t|\t\t|\t4\t|\t0\t|\t1\t|\t0\t|
9\t|\t8\t|\tclade\t|\t\t|\t4\t|\t1\t|\t1\t|\t1\t|";

    const NAMES_DATA: &str = "1\t|\tall\t|\t\t|\tsynonym\t|
1\t|\troot\t|\t\t|\tscientific name\t|
2\t|\tBacteria\t|\tBacteria <bacteria>\t|\tscientific name\t|
3\t|\tProteobacteria\t|\t\t|\tscientific name\t|
4\t|\tEscherichia\t|\t\t|\tscientific name\t|
5\t|\tEscherichia coli\t|\t\t|\tscientific name\t|
5\t|\tBacillus coli\t|\t\t|\tsynonym\t|
6\t|\tEscherichia albertii\t|\t\t|\tscientific name\t|
7\t|\tSalmonella\t|\t\t|\tscientific name\t|
8\t|\tEukaryota\t|\t\t|\tscientific name\t|
9\t|\tOpisthokonta\t|\t\t|\tsynonym\t|
42\t|\tNowhere\t|\t\t|\tscientific name\t|";

    fn taxonomy() -> Taxonomy {
        Taxonomy::from_readers(Cursor::new(NODES_DATA), Cursor::new(NAMES_DATA)).unwrap()
    }

    fn lca_id(taxonomy: &Taxonomy, taxa: &[TaxId]) -> Option<TaxId> {
        taxonomy.lca(taxa).ok().map(|node| node.taxon_id)
    }

    #[test]
    fn test_taxonomy_load() {
        let taxonomy = taxonomy();

        assert_eq!(taxonomy.len(), 9);
        assert_eq!(taxonomy.root().taxon_id, 1);
        assert_eq!(taxonomy.root().parent_id, 1);
        assert!(taxonomy.get(42).is_none());

        let coli = taxonomy.get(5).unwrap();
        assert_eq!(coli.parent_id, 4);
        assert_eq!(coli.rank, "species");
        assert_eq!(coli.scientific_name, "Escherichia coli");

        assert_eq!(taxonomy.get(1).unwrap().scientific_name, "root");
        assert_eq!(taxonomy.get(9).unwrap().scientific_name, "Unnamed taxon 9");
    }

    #[test]
    fn test_taxonomy_depths() {
        let taxonomy = taxonomy();
        let depths: Vec<(TaxId, usize)> = (1..=9)
            .map(|id| (id, taxonomy.get(id).unwrap().depth))
            .collect();
        assert_eq!(
            depths,
            vec![(1, 0), (2, 1), (3, 2), (4, 3), (5, 4), (6, 4), (7, 3), (8, 1), (9, 2)]
        );
    }

    #[test]
    fn test_taxonomy_duplicate_node_updates_entry() {
        let nodes = format!("{}\n5\t|\t7\t|\tstrain\t|", NODES_DATA);
        let taxonomy =
            Taxonomy::from_readers(Cursor::new(nodes), Cursor::new(NAMES_DATA)).unwrap();
        let node = taxonomy.get(5).unwrap();
        assert_eq!(taxonomy.len(), 9);
        assert_eq!(node.parent_id, 7);
        assert_eq!(node.rank, "strain");
        assert_eq!(node.depth, 4);
    }

    #[test]
    fn test_lineage() {
        let taxonomy = taxonomy();
        let lineage: Vec<TaxId> = taxonomy
            .lineage(taxonomy.get(5).unwrap())
            .map(|node| node.taxon_id)
            .collect();
        assert_eq!(lineage, vec![5, 4, 3, 2, 1]);
        assert_eq!(taxonomy.lineage(taxonomy.unknown()).count(), 0);
    }

    #[test]
    fn test_lca_single_taxon() {
        let taxonomy = taxonomy();
        assert_eq!(lca_id(&taxonomy, &[5]), Some(5));
        assert_eq!(lca_id(&taxonomy, &[1]), Some(1));
        assert_eq!(lca_id(&taxonomy, &[5, 5, 5]), Some(5));
    }

    #[test]
    fn test_lca_with_ancestor() {
        let taxonomy = taxonomy();
        assert_eq!(lca_id(&taxonomy, &[5, 4]), Some(4));
        assert_eq!(lca_id(&taxonomy, &[2, 6]), Some(2));
        assert_eq!(lca_id(&taxonomy, &[5, 1]), Some(1));
    }

    #[test]
    fn test_lca_siblings_and_cousins() {
        let taxonomy = taxonomy();
        assert_eq!(lca_id(&taxonomy, &[5, 6]), Some(4));
        assert_eq!(lca_id(&taxonomy, &[5, 7]), Some(3));
        assert_eq!(lca_id(&taxonomy, &[6, 7, 5]), Some(3));
    }

    #[test]
    fn test_lca_disjoint_lineages_meet_at_root() {
        let taxonomy = taxonomy();
        assert_eq!(lca_id(&taxonomy, &[5, 9]), Some(1));
        assert_eq!(lca_id(&taxonomy, &[2, 8]), Some(1));
    }

    #[test]
    fn test_lca_skips_unknown_taxa() {
        let taxonomy = taxonomy();
        assert_eq!(lca_id(&taxonomy, &[42, 5]), Some(5));
        assert_eq!(lca_id(&taxonomy, &[5, 1000, 6]), Some(4));
        assert!(matches!(taxonomy.lca(&[42, 1000]), Err(Error::NoValidTaxa)));
        assert!(matches!(taxonomy.lca(&[]), Err(Error::NoValidTaxa)));

        let unknown = taxonomy.lca_or_unknown(&[0, 42]);
        assert!(unknown.is_unknown());
        assert_eq!(unknown.scientific_name, UNKNOWN_NAME);
    }

    #[test]
    fn test_lca_order_independent() {
        let taxonomy = taxonomy();
        let orders: [[TaxId; 4]; 6] = [
            [5, 6, 7, 42],
            [42, 7, 6, 5],
            [6, 42, 5, 7],
            [7, 5, 42, 6],
            [5, 7, 6, 42],
            [6, 7, 42, 5],
        ];
        for order in &orders {
            assert_eq!(lca_id(&taxonomy, order), Some(3), "order {:?}", order);
        }
    }

    #[test]
    fn test_at_levels() {
        let taxonomy = taxonomy();
        let coli = taxonomy.get(5).unwrap();

        let levels = taxonomy.at_levels(coli, &["genus", "phylum", "family", "genus"]);
        assert_eq!(
            levels,
            vec!["Escherichia", "Proteobacteria", UNCLASSIFIED, "Escherichia"]
        );

        assert_eq!(taxonomy.at_levels(coli, &["species"]), vec!["Escherichia coli"]);
        assert!(taxonomy.at_levels::<&str>(coli, &[]).is_empty());
    }

    #[test]
    fn test_at_levels_for_unknown() {
        let taxonomy = taxonomy();
        let levels = taxonomy.at_levels(taxonomy.unknown(), &["genus", "no rank"]);
        assert_eq!(levels, vec![UNCLASSIFIED, UNCLASSIFIED]);
    }

    #[test]
    fn test_minimal_tree_scenario() {
        let nodes = "1\t|\t1\t|\troot\t|\n2\t|\t1\t|\tphylum\t|\n3\t|\t2\t|\tspecies\t|\n";
        let names = "1\t|\tRoot\t|\t\t|\tscientific name\t|\n\
                     2\t|\tPhylumus\t|\t\t|\tscientific name\t|\n\
                     3\t|\tSpecius\t|\t\t|\tscientific name\t|\n";
        let taxonomy = Taxonomy::from_readers(Cursor::new(nodes), Cursor::new(names)).unwrap();

        assert_eq!(lca_id(&taxonomy, &[3]), Some(3));
        assert_eq!(lca_id(&taxonomy, &[2, 3]), Some(2));

        let node = taxonomy.lca(&[3]).unwrap();
        assert_eq!(
            taxonomy.at_levels(node, &["phylum", "genus"]),
            vec!["Phylumus", UNCLASSIFIED]
        );
    }

    #[test]
    fn test_nodes_wrong_field_count() {
        let nodes = "1\t|\t1\t|\tno rank\t|\n2\t|\t1\n";
        let err = Taxonomy::from_readers(Cursor::new(nodes), Cursor::new("")).unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_names_wrong_field_count() {
        let names = "1\t|\troot\t|";
        let err = Taxonomy::from_readers(Cursor::new(NODES_DATA), Cursor::new(names)).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_invalid_taxon_id() {
        let nodes = "1\t|\t1\t|\tno rank\t|\nabc\t|\t1\t|\tgenus\t|\n";
        let err = Taxonomy::from_readers(Cursor::new(nodes), Cursor::new("")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let nodes = "0\t|\t0\t|\tno rank\t|\n";
        let err = Taxonomy::from_readers(Cursor::new(nodes), Cursor::new("")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_missing_parent() {
        let nodes = "1\t|\t1\t|\tno rank\t|\n2\t|\t77\t|\tgenus\t|\n";
        let err = Taxonomy::from_readers(Cursor::new(nodes), Cursor::new("")).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingParent {
                taxon: 2,
                parent: 77
            }
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let nodes = "1\t|\t1\t|\tno rank\t|\n2\t|\t3\t|\tgenus\t|\n3\t|\t2\t|\tgenus\t|\n";
        let err = Taxonomy::from_readers(Cursor::new(nodes), Cursor::new("")).unwrap_err();
        assert!(matches!(err, Error::Cycle(_)));
    }

    #[test]
    fn test_root_required_and_unique() {
        let nodes = "2\t|\t3\t|\tgenus\t|\n3\t|\t2\t|\tgenus\t|\n";
        let err = Taxonomy::from_readers(Cursor::new(nodes), Cursor::new("")).unwrap_err();
        assert!(matches!(err, Error::NoRoot));

        let nodes = "1\t|\t1\t|\tno rank\t|\n2\t|\t2\t|\tno rank\t|\n";
        let err = Taxonomy::from_readers(Cursor::new(nodes), Cursor::new("")).unwrap_err();
        assert!(matches!(err, Error::MultipleRoots(1, 2)));
    }

    fn arb_taxa() -> impl Strategy<Value = (Vec<TaxId>, Vec<TaxId>)> {
        let ids: Vec<TaxId> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 42, 1000];
        prop::collection::vec(prop::sample::select(ids), 1..10)
            .prop_flat_map(|taxa| (Just(taxa.clone()), Just(taxa).prop_shuffle()))
    }

    /// Random trees where node `i + 2` hangs below some node in `1..=i + 1`.
    fn arb_tree() -> impl Strategy<Value = Vec<TaxId>> {
        prop::collection::vec(any::<prop::sample::Index>(), 1..60).prop_map(|picks| {
            let mut parents = vec![1];
            for (i, pick) in picks.iter().enumerate() {
                parents.push(pick.index(i + 1) as TaxId + 1);
            }
            parents
        })
    }

    fn naive_lca(parents: &[TaxId], a: TaxId, b: TaxId) -> TaxId {
        let mut lineage = vec![a];
        while *lineage.last().unwrap() != 1 {
            lineage.push(parents[*lineage.last().unwrap() as usize - 1]);
        }
        let mut current = b;
        while !lineage.contains(&current) {
            current = parents[current as usize - 1];
        }
        current
    }

    proptest! {
        #[test]
        fn prop_lca_permutation_invariant((taxa, shuffled) in arb_taxa()) {
            let taxonomy = taxonomy();
            prop_assert_eq!(lca_id(&taxonomy, &taxa), lca_id(&taxonomy, &shuffled));
        }

        #[test]
        fn prop_lca_matches_lineage_intersection(
            parents in arb_tree(),
            a in any::<prop::sample::Index>(),
            b in any::<prop::sample::Index>(),
        ) {
            let nodes: String = parents
                .iter()
                .enumerate()
                .map(|(i, parent)| format!("{}\t|\t{}\t|\tno rank\t|\n", i + 1, parent))
                .collect();
            let taxonomy = Taxonomy::from_readers(Cursor::new(nodes), Cursor::new("")).unwrap();

            let a = a.index(parents.len()) as TaxId + 1;
            let b = b.index(parents.len()) as TaxId + 1;
            prop_assert_eq!(lca_id(&taxonomy, &[a, b]), Some(naive_lca(&parents, a, b)));
        }
    }
}
