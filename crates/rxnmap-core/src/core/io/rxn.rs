use crate::core::io::traits::ReactionFile;
use crate::core::models::atom::Atom;
use crate::core::models::element;
use crate::core::models::mapping::ReactionMapping;
use crate::core::models::molecule::{ModelError, Molecule};
use crate::core::models::reaction::{AtomRef, Reaction, ReactionSide};
use crate::core::models::topology::{Bond, BondOrder, BondStereo};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RxnError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: RxnParseErrorKind },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Invalid molecule on line {line}: {source}")]
    Model { line: usize, source: ModelError },
}

#[derive(Debug, Error)]
pub enum RxnParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Unsupported bond type {0}")]
    UnsupportedBondType(i32),
    #[error("Counts line does not declare a V2000 molfile")]
    UnsupportedVersion,
}

/// Header lines and atom-atom mapping numbers of an RXN file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RxnMetadata {
    pub name: String,
    pub program: String,
    pub comment: String,
    pub atom_maps: HashMap<AtomRef, u32>,
}

impl RxnMetadata {
    pub const PROGRAM: &'static str = "  rxnmap";

    /// Numbers every mapped pair, in reactant order, starting from 1.
    pub fn from_mapping(reaction: &Reaction, mapping: &ReactionMapping) -> Self {
        let mut atom_maps = HashMap::new();
        let mut next = 1;
        for (mol_id, molecule) in reaction.side(ReactionSide::Reactant) {
            for (idx, _) in molecule.atoms() {
                let reactant = AtomRef::new(mol_id, idx);
                if atom_maps.contains_key(&reactant) {
                    continue;
                }
                if let Some(product) = mapping.product_of(reactant) {
                    atom_maps.insert(reactant, next);
                    atom_maps.insert(product, next);
                    next += 1;
                }
            }
        }
        Self {
            name: reaction.id().unwrap_or_default().to_string(),
            program: Self::PROGRAM.to_string(),
            comment: String::new(),
            atom_maps,
        }
    }

    /// Pairs reactant and product atoms carrying the same mapping number.
    pub fn mapping(&self, reaction: &Reaction) -> ReactionMapping {
        let numbered = |side: ReactionSide| -> BTreeMap<u32, AtomRef> {
            reaction
                .side(side)
                .flat_map(|(mol_id, mol)| mol.atom_indices().map(move |idx| AtomRef::new(mol_id, idx)))
                .filter_map(|atom| self.atom_maps.get(&atom).map(|&n| (n, atom)))
                .collect()
        };
        let products = numbered(ReactionSide::Product);
        let mut mapping = ReactionMapping::new();
        for (number, reactant) in numbered(ReactionSide::Reactant) {
            if let Some(&product) = products.get(&number) {
                mapping.insert(reactant, product);
            }
        }
        mapping
    }
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_int(line: &str, start: usize, end: usize, line_num: usize) -> Result<i32, RxnError> {
    let value = slice_and_trim(line, start, end);
    if value.is_empty() {
        return Ok(0);
    }
    value.parse().map_err(|_| RxnError::Parse {
        line: line_num,
        kind: RxnParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

fn parse_float(line: &str, start: usize, end: usize, line_num: usize) -> Result<f64, RxnError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| RxnError::Parse {
        line: line_num,
        kind: RxnParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

fn charge_from_code(code: i32) -> i8 {
    match code {
        1 => 3,
        2 => 2,
        3 => 1,
        5 => -1,
        6 => -2,
        7 => -3,
        _ => 0,
    }
}

fn charge_to_code(charge: i8) -> i32 {
    match charge {
        3 => 1,
        2 => 2,
        1 => 3,
        -1 => 5,
        -2 => 6,
        -3 => 7,
        _ => 0,
    }
}

fn stereo_from_code(code: i32) -> BondStereo {
    match code {
        BondStereo::UP_CODE => BondStereo::Up,
        BondStereo::DOWN_CODE => BondStereo::Down,
        BondStereo::UP_OR_DOWN_CODE => BondStereo::UpOrDown,
        BondStereo::E_OR_Z_CODE => BondStereo::EOrZ,
        _ => BondStereo::None,
    }
}

struct Lines {
    lines: Vec<String>,
    pos: usize,
}

impl Lines {
    fn next(&mut self, what: &str) -> Result<(usize, &str), RxnError> {
        let line = self
            .lines
            .get(self.pos)
            .ok_or_else(|| RxnError::MissingRecord(what.to_string()))?;
        self.pos += 1;
        Ok((self.pos, line.as_str()))
    }
}

fn read_molecule(
    lines: &mut Lines,
    id_prefix: &str,
    atom_maps: &mut Vec<(usize, u32)>,
) -> Result<Molecule, RxnError> {
    loop {
        let (_, line) = lines.next("$MOL")?;
        if line.starts_with("$MOL") {
            break;
        }
    }
    let (_, name) = lines.next("molecule name")?;
    let mut molecule = Molecule::new(name.trim());
    lines.next("molecule program line")?;
    lines.next("molecule comment")?;

    let (counts_num, counts) = lines.next("counts line")?;
    if counts.len() >= 39 && !counts.contains("V2000") {
        return Err(RxnError::Parse {
            line: counts_num,
            kind: RxnParseErrorKind::UnsupportedVersion,
        });
    }
    let counts = counts.to_string();
    let atom_count = parse_int(&counts, 0, 3, counts_num)?.max(0) as usize;
    let bond_count = parse_int(&counts, 3, 6, counts_num)?.max(0) as usize;

    for i in 0..atom_count {
        let (num, line) = lines.next("atom block")?;
        let x = parse_float(line, 0, 10, num)?;
        let y = parse_float(line, 10, 20, num)?;
        let symbol = slice_and_trim(line, 31, 34);
        let charge = charge_from_code(parse_int(line, 36, 39, num)?);
        let map_number = parse_int(line, 60, 63, num)?;
        let atom = Atom::new(&format!("{id_prefix}.{}", i + 1), symbol)
            .with_charge(charge)
            .with_position(x, y);
        let idx = molecule.add_atom(atom);
        if map_number > 0 {
            atom_maps.push((idx.index(), map_number as u32));
        }
    }

    let atoms: Vec<_> = molecule.atom_indices().collect();
    for _ in 0..bond_count {
        let (num, line) = lines.next("bond block")?;
        let a = parse_int(line, 0, 3, num)?;
        let b = parse_int(line, 3, 6, num)?;
        let order = match parse_int(line, 6, 9, num)? {
            1 => BondOrder::Single,
            2 => BondOrder::Double,
            3 => BondOrder::Triple,
            4 => BondOrder::Aromatic,
            other => {
                return Err(RxnError::Parse {
                    line: num,
                    kind: RxnParseErrorKind::UnsupportedBondType(other),
                });
            }
        };
        let stereo = stereo_from_code(parse_int(line, 9, 12, num)?);
        let endpoint = |n: i32| {
            usize::try_from(n - 1)
                .ok()
                .and_then(|i| atoms.get(i).copied())
                .ok_or(RxnError::Model {
                    line: num,
                    source: ModelError::AtomOutOfRange(n.max(0) as usize),
                })
        };
        let (a, b) = (endpoint(a)?, endpoint(b)?);
        molecule
            .add_bond(a, b, Bond::new(order).with_stereo(stereo))
            .map_err(|source| RxnError::Model { line: num, source })?;
    }

    loop {
        let (num, line) = lines.next("M  END")?;
        if line.starts_with("M  END") {
            break;
        }
        if line.starts_with("M  CHG") {
            let entries = parse_int(line, 6, 9, num)?.max(0) as usize;
            for k in 0..entries {
                let start = 9 + k * 8;
                let atom = parse_int(line, start, start + 4, num)?;
                let charge = parse_int(line, start + 4, start + 8, num)?;
                let idx = usize::try_from(atom - 1).ok().and_then(|i| atoms.get(i).copied());
                if let Some(a) = idx.and_then(|idx| molecule.atom_mut(idx)) {
                    a.formal_charge = charge.clamp(i8::MIN.into(), i8::MAX.into()) as i8;
                }
            }
        }
    }

    for &idx in &atoms {
        let bond_sum: f64 = molecule
            .bonds_of(idx)
            .map(|(_, bond)| match bond.order {
                BondOrder::Aromatic => 1.5,
                other => other.electron_matrix_value(),
            })
            .sum();
        if let Some(atom) = molecule.atom_mut(idx) {
            atom.is_aromatic = false;
            atom.hydrogen_count = element::implicit_hydrogens(&atom.symbol, atom.formal_charge, bond_sum);
        }
    }
    for (a, b, bond) in molecule.bonds().map(|(a, b, bond)| (a, b, *bond)).collect::<Vec<_>>() {
        if bond.order == BondOrder::Aromatic {
            for idx in [a, b] {
                if let Some(atom) = molecule.atom_mut(idx) {
                    atom.is_aromatic = true;
                }
            }
        }
    }

    Ok(molecule)
}

fn write_molecule(
    molecule: &Molecule,
    atom_maps: impl Fn(usize) -> u32,
    writer: &mut impl Write,
) -> io::Result<()> {
    writeln!(writer, "$MOL")?;
    writeln!(writer, "{}", molecule.name())?;
    writeln!(writer, "{}", RxnMetadata::PROGRAM)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
        molecule.atom_count(),
        molecule.bond_count()
    )?;
    for (idx, atom) in molecule.atoms() {
        let (x, y) = atom.position.map_or((0.0, 0.0), |p| (p.x, p.y));
        writeln!(
            writer,
            "{:>10.4}{:>10.4}{:>10.4} {:<3}{:>2}{:>3}{:>3}{:>3}{:>3}{:>3}{:>3}{:>3}{:>3}{:>3}{:>3}{:>3}",
            x,
            y,
            0.0,
            atom.symbol,
            0,
            charge_to_code(atom.formal_charge),
            0,
            0,
            0,
            0,
            0,
            0,
            0,
            atom_maps(idx.index()),
            0,
            0
        )?;
    }
    for (a, b, bond) in molecule.bonds() {
        writeln!(
            writer,
            "{:>3}{:>3}{:>3}{:>3}  0  0  0",
            a.index() + 1,
            b.index() + 1,
            bond.order.mdl_code(),
            bond.stereo.code()
        )?;
    }
    let charged: Vec<(usize, i8)> = molecule
        .atoms()
        .filter(|(_, atom)| atom.formal_charge != 0)
        .map(|(idx, atom)| (idx.index() + 1, atom.formal_charge))
        .collect();
    for chunk in charged.chunks(8) {
        write!(writer, "M  CHG{:>3}", chunk.len())?;
        for (atom, charge) in chunk {
            write!(writer, " {atom:>3} {charge:>3}")?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "M  END")
}

/// MDL RXN (V2000) files with atom-atom mapping numbers.
///
/// Every molecule slot is read as its own molecule; atoms get the ids
/// `r<k>.<i>` and `p<k>.<i>` (1-based). Implicit hydrogens are derived from
/// default valences since the format does not store them.
pub struct RxnFile;

impl ReactionFile for RxnFile {
    type Metadata = RxnMetadata;
    type Error = RxnError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Reaction, Self::Metadata), Self::Error> {
        let mut lines = Lines {
            lines: reader.lines().collect::<Result<_, _>>()?,
            pos: 0,
        };

        let (num, header) = lines.next("$RXN")?;
        if !header.starts_with("$RXN") {
            return Err(RxnError::MissingRecord(format!("$RXN (line {num})")));
        }
        let name = lines.next("reaction name")?.1.trim().to_string();
        let program = lines.next("program line")?.1.to_string();
        let comment = lines.next("comment")?.1.trim().to_string();
        let (counts_num, counts) = lines.next("reaction counts line")?;
        let counts = counts.to_string();
        let reactants = parse_int(&counts, 0, 3, counts_num)?.max(0) as usize;
        let products = parse_int(&counts, 3, 6, counts_num)?.max(0) as usize;

        let mut reaction = Reaction::new();
        if !name.is_empty() {
            reaction.set_id(&name);
        }
        let mut atom_maps = HashMap::new();
        for (side, count, prefix) in [
            (ReactionSide::Reactant, reactants, "r"),
            (ReactionSide::Product, products, "p"),
        ] {
            for k in 1..=count {
                let mut numbers = Vec::new();
                let molecule = read_molecule(&mut lines, &format!("{prefix}{k}"), &mut numbers)?;
                let mol_id = match side {
                    ReactionSide::Reactant => reaction.add_reactant(molecule),
                    ReactionSide::Product => reaction.add_product(molecule),
                };
                for (idx, number) in numbers {
                    atom_maps.insert(AtomRef::new(mol_id, NodeIndex::new(idx)), number);
                }
            }
        }

        Ok((
            reaction,
            RxnMetadata {
                name,
                program,
                comment,
                atom_maps,
            },
        ))
    }

    fn write_to(
        reaction: &Reaction,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "$RXN")?;
        writeln!(writer, "{}", metadata.name)?;
        writeln!(writer, "{}", metadata.program)?;
        writeln!(writer, "{}", metadata.comment)?;
        writeln!(
            writer,
            "{:>3}{:>3}",
            reaction.reactant_count(),
            reaction.product_count()
        )?;
        for side in [ReactionSide::Reactant, ReactionSide::Product] {
            for (mol_id, molecule) in reaction.side(side) {
                let number = |idx: usize| {
                    metadata
                        .atom_maps
                        .get(&AtomRef::new(mol_id, NodeIndex::new(idx)))
                        .copied()
                        .unwrap_or(0)
                };
                write_molecule(molecule, number, writer)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn substitution() -> (Reaction, ReactionMapping) {
        let mut chloromethane = Molecule::new("chloromethane");
        let c = chloromethane.add_atom(Atom::new("c", "C").with_hydrogens(3).with_position(0.0, 0.0));
        let cl = chloromethane.add_atom(Atom::new("cl", "Cl").with_position(1.5, 0.0));
        chloromethane.add_bond(c, cl, Bond::default()).unwrap();

        let mut hydroxide = Molecule::new("hydroxide");
        let o = hydroxide.add_atom(Atom::new("o", "O").with_hydrogens(1).with_charge(-1));

        let mut methanol = Molecule::new("methanol");
        let c2 = methanol.add_atom(Atom::new("c2", "C").with_hydrogens(3));
        let o2 = methanol.add_atom(Atom::new("o2", "O").with_hydrogens(1));
        methanol.add_bond(c2, o2, Bond::default()).unwrap();

        let mut chloride = Molecule::new("chloride");
        let cl2 = chloride.add_atom(Atom::new("cl2", "Cl").with_charge(-1));

        let mut reaction = Reaction::new();
        reaction.set_id("SN2");
        let r1 = reaction.add_reactant(chloromethane);
        let r2 = reaction.add_reactant(hydroxide);
        let p1 = reaction.add_product(methanol);
        let p2 = reaction.add_product(chloride);

        let mut mapping = ReactionMapping::new();
        mapping.insert(AtomRef::new(r1, c), AtomRef::new(p1, c2));
        mapping.insert(AtomRef::new(r1, cl), AtomRef::new(p2, cl2));
        mapping.insert(AtomRef::new(r2, o), AtomRef::new(p1, o2));
        (reaction, mapping)
    }

    fn write(reaction: &Reaction, metadata: &RxnMetadata) -> String {
        let mut buffer = Vec::new();
        RxnFile::write_to(reaction, metadata, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn mapping_numbers_follow_reactant_order() {
        let (reaction, mapping) = substitution();
        let metadata = RxnMetadata::from_mapping(&reaction, &mapping);
        let r1 = reaction.reactant_ids()[0];
        let r2 = reaction.reactant_ids()[1];
        assert_eq!(metadata.atom_maps[&AtomRef::new(r1, NodeIndex::new(0))], 1);
        assert_eq!(metadata.atom_maps[&AtomRef::new(r1, NodeIndex::new(1))], 2);
        assert_eq!(metadata.atom_maps[&AtomRef::new(r2, NodeIndex::new(0))], 3);
        assert_eq!(metadata.atom_maps.len(), 6);
        assert_eq!(metadata.mapping(&reaction), mapping);
    }

    #[test]
    fn written_atom_lines_carry_symbol_charge_and_map_number() {
        let (reaction, mapping) = substitution();
        let text = write(&reaction, &RxnMetadata::from_mapping(&reaction, &mapping));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "$RXN");
        assert_eq!(lines[1], "SN2");
        assert_eq!(lines[4], "  2  2");
        assert_eq!(lines[5], "$MOL");
        assert_eq!(&lines[9][0..6], "  2  1");
        let chlorine = lines[11];
        assert_eq!(chlorine.len(), 69);
        assert_eq!(&chlorine[31..34], "Cl ");
        assert_eq!(&chlorine[60..63], "  2");
        assert_eq!(&chlorine[0..10], "    1.5000");
        assert!(text.contains("M  CHG  1   1  -1"));
    }

    #[test]
    fn rxn_text_reads_back_with_mapping_and_charges() {
        let (reaction, mapping) = substitution();
        let text = write(&reaction, &RxnMetadata::from_mapping(&reaction, &mapping));
        let (again, metadata) = RxnFile::read_from(&mut Cursor::new(text)).unwrap();

        assert_eq!(again.id(), Some("SN2"));
        assert_eq!(again.reactant_count(), 2);
        assert_eq!(again.product_count(), 2);

        let chloromethane = again.reactant(0).unwrap();
        assert_eq!(chloromethane.atom(NodeIndex::new(0)).unwrap().id, "r1.1");
        assert_eq!(chloromethane.atom(NodeIndex::new(0)).unwrap().hydrogen_count, 3);
        let hydroxide = again.reactant(1).unwrap();
        let oxygen = hydroxide.atom(NodeIndex::new(0)).unwrap();
        assert_eq!(oxygen.formal_charge, -1);
        assert_eq!(oxygen.hydrogen_count, 1);

        assert_eq!(metadata.mapping(&again).len(), 3);
    }

    #[test]
    fn truncated_files_report_the_missing_record() {
        let text = "$RXN\nname\n  prog\n\n  1  1\n";
        assert!(matches!(
            RxnFile::read_from(&mut Cursor::new(text)),
            Err(RxnError::MissingRecord(_))
        ));
    }

    #[test]
    fn bad_numbers_are_reported_with_their_line() {
        let text = "$RXN\n\n\n\n  1  0\n$MOL\nx\n\n\n  1  0  0  0  0  0  0  0  0  0999 V2000\n    abc    0.0000    0.0000 C   0  0\nM  END\n";
        let err = RxnFile::read_from(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(
            err,
            RxnError::Parse {
                line: 11,
                kind: RxnParseErrorKind::InvalidFloat { .. }
            }
        ));
    }

    #[test]
    fn writes_to_a_path() {
        let (reaction, mapping) = substitution();
        let dir = tempdir().unwrap();
        let path = dir.path().join("mapped.rxn");
        RxnFile::write_to_path(&reaction, &RxnMetadata::from_mapping(&reaction, &mapping), &path).unwrap();
        let (again, metadata) = RxnFile::read_from_path(&path).unwrap();
        assert_eq!(again.product_count(), 2);
        assert_eq!(metadata.atom_maps.len(), 6);
    }
}
