use crate::core::chem::signature::SubgraphSignature;
use crate::core::models::ids::MoleculeId;
use crate::core::models::mapping::AtomAtomMapping;
use crate::core::models::molecule::Molecule;
use nalgebra::Point2;
use petgraph::graph::NodeIndex;
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Axis-aligned 2-D bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds {
    pub fn center(&self) -> Point2<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// A connected group of mapped atoms in one molecule, linked to the block
/// holding their partner atoms in the other molecule.
#[derive(Debug)]
pub struct Block<'a> {
    molecule_id: MoleculeId,
    molecule: &'a Molecule,
    atom_map: BTreeMap<NodeIndex, NodeIndex>,
    partner: Option<usize>,
    signature: OnceCell<SubgraphSignature>,
    bounds: OnceCell<Option<Bounds>>,
    center: OnceCell<Option<Point2<f64>>>,
}

impl<'a> Block<'a> {
    pub fn new(molecule_id: MoleculeId, molecule: &'a Molecule) -> Self {
        Self {
            molecule_id,
            molecule,
            atom_map: BTreeMap::new(),
            partner: None,
            signature: OnceCell::new(),
            bounds: OnceCell::new(),
            center: OnceCell::new(),
        }
    }

    /// Records that `atom` of this block corresponds to `partner_atom` of the
    /// partner block. Cached signature and geometry are reset.
    pub fn add_mapping(&mut self, atom: NodeIndex, partner_atom: NodeIndex) {
        self.atom_map.insert(atom, partner_atom);
        self.signature = OnceCell::new();
        self.bounds = OnceCell::new();
        self.center = OnceCell::new();
    }

    pub fn molecule_id(&self) -> MoleculeId {
        self.molecule_id
    }

    pub fn molecule(&self) -> &'a Molecule {
        self.molecule
    }

    pub fn atom_count(&self) -> usize {
        self.atom_map.len()
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.atom_map.keys().copied()
    }

    pub fn partner_atom(&self, atom: NodeIndex) -> Option<NodeIndex> {
        self.atom_map.get(&atom).copied()
    }

    /// Index of the partner block in the opposite block list.
    pub fn partner(&self) -> Option<usize> {
        self.partner
    }

    pub fn set_partner(&mut self, partner: usize) {
        self.partner = Some(partner);
    }

    pub fn signature(&self) -> &SubgraphSignature {
        self.signature.get_or_init(|| {
            let atoms: Vec<NodeIndex> = self.atoms().collect();
            SubgraphSignature::new(self.molecule, &atoms)
        })
    }

    pub fn signature_str(&self) -> &str {
        self.signature().as_str()
    }

    pub fn labels(&self) -> &[usize] {
        self.signature().labels()
    }

    /// Blocks of the same kind have equal signatures.
    pub fn is_same_kind(&self, other: &Block<'_>) -> bool {
        self.signature_str() == other.signature_str()
    }

    /// Permutation taking this block's atoms onto the partner atoms, with both
    /// index sets compacted to `0..atom_count()` in ascending order.
    pub fn mapping_permutation(&self) -> Vec<usize> {
        let compact_partner: BTreeMap<NodeIndex, usize> = self
            .atom_map
            .values()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(pos, idx)| (idx, pos))
            .collect();
        self.atom_map
            .values()
            .filter_map(|partner| compact_partner.get(partner).copied())
            .collect()
    }

    /// Bounding box of the positioned atoms, `None` if no atom has a position.
    pub fn bounds(&self) -> Option<Bounds> {
        *self.bounds.get_or_init(|| {
            let mut points = self
                .atoms()
                .filter_map(|idx| self.molecule.atom(idx).and_then(|atom| atom.position));
            let first = points.next()?;
            Some(points.fold(
                Bounds {
                    min: first,
                    max: first,
                },
                |b, p| Bounds {
                    min: Point2::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                    max: Point2::new(b.max.x.max(p.x), b.max.y.max(p.y)),
                },
            ))
        })
    }

    pub fn center_point(&self) -> Option<Point2<f64>> {
        *self.center.get_or_init(|| self.bounds().map(|b| b.center()))
    }

    pub fn set_center_point(&mut self, center: Point2<f64>) {
        self.center = OnceCell::from(Some(center));
    }
}

impl PartialEq for Block<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.signature_str() == other.signature_str()
    }
}

impl Eq for Block<'_> {}

impl PartialOrd for Block<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Block<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.signature_str().cmp(other.signature_str())
    }
}

/// Blocks of a reactant/product match, one pair per connected component of
/// the mapped reactant atoms.
///
/// Both lists are sorted by signature and each block's partner index points
/// into the opposite list.
#[derive(Debug)]
pub struct BlockPairing<'a> {
    reactant_blocks: Vec<Block<'a>>,
    product_blocks: Vec<Block<'a>>,
}

impl<'a> BlockPairing<'a> {
    pub fn from_mapping(
        reactant: (MoleculeId, &'a Molecule),
        product: (MoleculeId, &'a Molecule),
        mapping: &AtomAtomMapping,
    ) -> Self {
        let mut pairs: Vec<(Block<'a>, Block<'a>)> = mapped_components(reactant.1, mapping)
            .into_iter()
            .map(|component| {
                let mut left = Block::new(reactant.0, reactant.1);
                let mut right = Block::new(product.0, product.1);
                for atom in component {
                    if let Some(image) = mapping.get(atom) {
                        left.add_mapping(atom, image);
                        right.add_mapping(image, atom);
                    }
                }
                (left, right)
            })
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.0.atoms().cmp(b.0.atoms())));

        let mut product_order: Vec<usize> = (0..pairs.len()).collect();
        product_order.sort_by(|&i, &j| {
            pairs[i]
                .1
                .cmp(&pairs[j].1)
                .then_with(|| pairs[i].1.atoms().cmp(pairs[j].1.atoms()))
        });
        let mut product_pos = vec![0; pairs.len()];
        for (pos, &pair) in product_order.iter().enumerate() {
            product_pos[pair] = pos;
        }

        let mut reactant_blocks = Vec::with_capacity(pairs.len());
        let mut slots: Vec<Option<Block<'a>>> = (0..pairs.len()).map(|_| None).collect();
        for (i, (mut left, mut right)) in pairs.into_iter().enumerate() {
            left.set_partner(product_pos[i]);
            right.set_partner(i);
            reactant_blocks.push(left);
            slots[product_pos[i]] = Some(right);
        }

        Self {
            reactant_blocks,
            product_blocks: slots.into_iter().flatten().collect(),
        }
    }

    pub fn reactant_blocks(&self) -> &[Block<'a>] {
        &self.reactant_blocks
    }

    pub fn product_blocks(&self) -> &[Block<'a>] {
        &self.product_blocks
    }

    pub fn partner_of(&self, reactant_block: usize) -> Option<&Block<'a>> {
        self.reactant_blocks
            .get(reactant_block)?
            .partner()
            .and_then(|p| self.product_blocks.get(p))
    }

    /// Number of reactant blocks whose partner has the same signature.
    pub fn conserved_count(&self) -> usize {
        (0..self.reactant_blocks.len())
            .filter(|&i| {
                self.partner_of(i)
                    .is_some_and(|partner| partner.is_same_kind(&self.reactant_blocks[i]))
            })
            .count()
    }
}

/// Connected components of the subgraph induced by the mapped query atoms.
fn mapped_components(molecule: &Molecule, mapping: &AtomAtomMapping) -> Vec<Vec<NodeIndex>> {
    let mut visited = BTreeSet::new();
    let mut components = Vec::new();
    for (start, _) in mapping.iter() {
        if molecule.atom(start).is_none() || !visited.insert(start) {
            continue;
        }
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(cur) = queue.pop_front() {
            for nb in molecule.neighbors(cur) {
                if mapping.contains_query(nb) && visited.insert(nb) {
                    component.push(nb);
                    queue.push_back(nb);
                }
            }
        }
        component.sort();
        components.push(component);
    }
    components
}
