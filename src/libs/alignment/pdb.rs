//! The source-structure record carried by every aligned chain.
//!
//! Fields mirror what a structure parser hands over: secondary structure,
//! bonds, annotations, atoms and residues. None of them is interpreted by the
//! scheduler; they only have to survive the trip across the process group.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CisPep {
    pub res1: i32,
    pub res2: i32,
    pub angle: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeqAdv {
    pub res: i32,
    pub code: [u8; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DbRef {
    pub start: i32,
    pub end: i32,
    pub db: [u8; 8],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SsBond {
    pub res1: i32,
    pub res2: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BetaSheetPair {
    pub start: i32,
    pub end: i32,
    pub sense: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BetaSheet {
    pub id: [u8; 4],
    pub strands: Vec<BetaSheetPair>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlphaHelix {
    pub start: i32,
    pub end: i32,
    pub kind: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HydrogenBond {
    pub donor: i32,
    pub acceptor: i32,
    pub energy: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BetaPair {
    pub res1: i32,
    pub res2: i32,
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Atom {
    pub coords: [f64; 3],
    pub res: i32,
    pub name: [u8; 4],
    pub element: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TempResidue {
    pub index: i32,
    pub name: [u8; 4],
    pub first_atom: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Residue {
    pub index: i32,
    pub name: [u8; 4],
    pub first_atom: i32,
    pub num_atoms: i32,
    pub secondary: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbChain {
    pub cis_peps: Vec<CisPep>,
    pub seq_advs: Vec<SeqAdv>,
    pub dbrefs: Vec<DbRef>,
    pub ssbonds: Vec<SsBond>,
    pub beta_sheets: Vec<BetaSheet>,
    pub alpha_helices: Vec<AlphaHelix>,
    pub hbonds: Vec<HydrogenBond>,
    pub beta_pairs: Vec<BetaPair>,
    pub atoms: Vec<Atom>,
    pub chain_name: u8,
    pub temp_atoms: u8,
    pub terminated: bool,
    pub temp_residues: Vec<TempResidue>,
    pub secondary_calculated: bool,
    pub residues: Vec<Residue>,
    pub id_string: String,
    pub seq_name: String,
    pub seq: Vec<u8>,
}

impl PdbChain {
    /// Minimal record for a chain known only by its sequence.
    ///
    /// ```
    /// use psma::libs::alignment::PdbChain;
    /// let chain = PdbChain::from_sequence("1ubq_A", b"MQIF");
    /// assert_eq!(chain.len(), 4);
    /// assert_eq!(chain.chain_name, b'A');
    /// assert_eq!(&chain.residues[1].name, b"Q\0\0\0");
    /// ```
    pub fn from_sequence(name: &str, seq: &[u8]) -> Self {
        let residues = seq
            .iter()
            .enumerate()
            .map(|(i, &b)| Residue {
                index: i as i32,
                name: [b.to_ascii_uppercase(), 0, 0, 0],
                first_atom: 0,
                num_atoms: 0,
                secondary: b'-',
            })
            .collect();

        // "1ubq_A" -> 'A'; names without a suffix get a blank chain id
        let chain_name = match name.rsplit_once('_') {
            Some((_, suffix)) if suffix.len() == 1 => suffix.as_bytes()[0],
            _ => b' ',
        };

        Self {
            chain_name,
            terminated: true,
            residues,
            id_string: name.to_string(),
            seq_name: name.to_string(),
            seq: seq.to_vec(),
            ..Default::default()
        }
    }

    /// Number of residues
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}
