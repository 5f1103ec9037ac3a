//! Field layouts of the fixed-size records and of the source-structure record.

use super::cursor::ByteReader;
use super::error::WireResult;
use super::prim::*;
use crate::libs::alignment::pdb::*;
use crate::libs::alignment::{AlignedBlock, ResiduePosition};

pub const RESIDUE_POSITION_LEN: usize = 3 * F64_LEN + I32_LEN + 1;
const ALIGNED_BLOCK_LEN: usize = 2 * I32_LEN;
const CIS_PEP_LEN: usize = 2 * I32_LEN + F64_LEN;
const SEQ_ADV_LEN: usize = I32_LEN + 4;
const DBREF_LEN: usize = 2 * I32_LEN + 8;
const SSBOND_LEN: usize = 2 * I32_LEN;
const BETA_SHEET_PAIR_LEN: usize = 3 * I32_LEN;
const BETA_SHEET_MIN_LEN: usize = 4 + I32_LEN;
const ALPHA_HELIX_LEN: usize = 3 * I32_LEN;
const HBOND_LEN: usize = 2 * I32_LEN + F64_LEN;
const BETA_PAIR_LEN: usize = 2 * I32_LEN + 1;
const ATOM_LEN: usize = 3 * F64_LEN + I32_LEN + 4 + 1;
const TEMP_RESIDUE_LEN: usize = 2 * I32_LEN + 4;
const RESIDUE_LEN: usize = 3 * I32_LEN + 4 + 1;

impl Wire for ResiduePosition {
    fn wire_len(&self) -> usize {
        RESIDUE_POSITION_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_coords(out, &self.coords);
        put_i32(out, self.index);
        put_flag_u8(out, self.has_coords);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            coords: take_coords(reader, "residue position coords")?,
            index: take_i32(reader, "residue position index")?,
            has_coords: take_flag_u8(reader, "residue position has_coords")?,
        })
    }
}

impl Wire for AlignedBlock {
    fn wire_len(&self) -> usize {
        ALIGNED_BLOCK_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.first);
        put_i32(out, self.last);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            first: take_i32(reader, "block first")?,
            last: take_i32(reader, "block last")?,
        })
    }
}

impl Wire for CisPep {
    fn wire_len(&self) -> usize {
        CIS_PEP_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.res1);
        put_i32(out, self.res2);
        put_f64(out, self.angle);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            res1: take_i32(reader, "cis_pep")?,
            res2: take_i32(reader, "cis_pep")?,
            angle: take_f64(reader, "cis_pep")?,
        })
    }
}

impl Wire for SeqAdv {
    fn wire_len(&self) -> usize {
        SEQ_ADV_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.res);
        out.extend_from_slice(&self.code);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            res: take_i32(reader, "seq_adv")?,
            code: reader.read_array::<4>("seq_adv")?,
        })
    }
}

impl Wire for DbRef {
    fn wire_len(&self) -> usize {
        DBREF_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.start);
        put_i32(out, self.end);
        out.extend_from_slice(&self.db);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            start: take_i32(reader, "dbref")?,
            end: take_i32(reader, "dbref")?,
            db: reader.read_array::<8>("dbref")?,
        })
    }
}

impl Wire for SsBond {
    fn wire_len(&self) -> usize {
        SSBOND_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.res1);
        put_i32(out, self.res2);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            res1: take_i32(reader, "ssbond")?,
            res2: take_i32(reader, "ssbond")?,
        })
    }
}

impl Wire for BetaSheetPair {
    fn wire_len(&self) -> usize {
        BETA_SHEET_PAIR_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.start);
        put_i32(out, self.end);
        put_i32(out, self.sense);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            start: take_i32(reader, "beta sheet strand")?,
            end: take_i32(reader, "beta sheet strand")?,
            sense: take_i32(reader, "beta sheet strand")?,
        })
    }
}

impl Wire for BetaSheet {
    fn wire_len(&self) -> usize {
        4 + vec_len(&self.strands)
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        out.extend_from_slice(&self.id);
        put_vec(out, &self.strands, "beta sheet strands")
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            id: reader.read_array::<4>("beta sheet id")?,
            strands: take_vec(reader, "beta sheet strands", BETA_SHEET_PAIR_LEN)?,
        })
    }
}

impl Wire for AlphaHelix {
    fn wire_len(&self) -> usize {
        ALPHA_HELIX_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.start);
        put_i32(out, self.end);
        put_i32(out, self.kind);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            start: take_i32(reader, "alpha helix")?,
            end: take_i32(reader, "alpha helix")?,
            kind: take_i32(reader, "alpha helix")?,
        })
    }
}

impl Wire for HydrogenBond {
    fn wire_len(&self) -> usize {
        HBOND_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.donor);
        put_i32(out, self.acceptor);
        put_f64(out, self.energy);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            donor: take_i32(reader, "hbond")?,
            acceptor: take_i32(reader, "hbond")?,
            energy: take_f64(reader, "hbond")?,
        })
    }
}

impl Wire for BetaPair {
    fn wire_len(&self) -> usize {
        BETA_PAIR_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.res1);
        put_i32(out, self.res2);
        put_flag_u8(out, self.parallel);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            res1: take_i32(reader, "beta pair")?,
            res2: take_i32(reader, "beta pair")?,
            parallel: take_flag_u8(reader, "beta pair parallel")?,
        })
    }
}

impl Wire for Atom {
    fn wire_len(&self) -> usize {
        ATOM_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_coords(out, &self.coords);
        put_i32(out, self.res);
        out.extend_from_slice(&self.name);
        put_u8(out, self.element);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            coords: take_coords(reader, "atom coords")?,
            res: take_i32(reader, "atom res")?,
            name: reader.read_array::<4>("atom name")?,
            element: take_u8(reader, "atom element")?,
        })
    }
}

impl Wire for TempResidue {
    fn wire_len(&self) -> usize {
        TEMP_RESIDUE_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.index);
        out.extend_from_slice(&self.name);
        put_i32(out, self.first_atom);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            index: take_i32(reader, "temp residue")?,
            name: reader.read_array::<4>("temp residue name")?,
            first_atom: take_i32(reader, "temp residue")?,
        })
    }
}

impl Wire for Residue {
    fn wire_len(&self) -> usize {
        RESIDUE_LEN
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_i32(out, self.index);
        out.extend_from_slice(&self.name);
        put_i32(out, self.first_atom);
        put_i32(out, self.num_atoms);
        put_u8(out, self.secondary);
        Ok(())
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        Ok(Self {
            index: take_i32(reader, "residue index")?,
            name: reader.read_array::<4>("residue name")?,
            first_atom: take_i32(reader, "residue first_atom")?,
            num_atoms: take_i32(reader, "residue num_atoms")?,
            secondary: take_u8(reader, "residue secondary")?,
        })
    }
}

/// Every variable-length part is count-prefixed except `residues`, whose
/// count (the chain length) is written ahead of the atoms.
impl Wire for PdbChain {
    fn wire_len(&self) -> usize {
        vec_len(&self.cis_peps)
            + vec_len(&self.seq_advs)
            + vec_len(&self.dbrefs)
            + vec_len(&self.ssbonds)
            + vec_len(&self.beta_sheets)
            + vec_len(&self.alpha_helices)
            + vec_len(&self.hbonds)
            + vec_len(&self.beta_pairs)
            + I32_LEN // length
            + vec_len(&self.atoms)
            + 2 // chain_name, temp_atoms
            + I32_LEN // terminated
            + vec_len(&self.temp_residues)
            + I32_LEN // secondary_calculated
            + self.residues.len() * RESIDUE_LEN
            + cstr_len(&self.id_string)
            + cstr_len(&self.seq_name)
            + bytes_len(&self.seq)
    }

    fn put(&self, out: &mut Vec<u8>) -> WireResult<()> {
        put_vec(out, &self.cis_peps, "cis_peps")?;
        put_vec(out, &self.seq_advs, "seq_advs")?;
        put_vec(out, &self.dbrefs, "dbrefs")?;
        put_vec(out, &self.ssbonds, "ssbonds")?;
        put_vec(out, &self.beta_sheets, "beta_sheets")?;
        put_vec(out, &self.alpha_helices, "alpha_helices")?;
        put_vec(out, &self.hbonds, "hbonds")?;
        put_vec(out, &self.beta_pairs, "beta_pairs")?;
        put_count(out, self.residues.len(), "chain length")?;
        put_vec(out, &self.atoms, "atoms")?;
        put_u8(out, self.chain_name);
        put_u8(out, self.temp_atoms);
        put_flag_i32(out, self.terminated);
        put_vec(out, &self.temp_residues, "temp_residues")?;
        put_flag_i32(out, self.secondary_calculated);
        for residue in &self.residues {
            residue.put(out)?;
        }
        put_cstr(out, &self.id_string, "id_string")?;
        put_cstr(out, &self.seq_name, "seq name")?;
        put_bytes(out, &self.seq, "seq")
    }

    fn take(reader: &mut ByteReader<'_>) -> WireResult<Self> {
        let cis_peps = take_vec(reader, "cis_peps", CIS_PEP_LEN)?;
        let seq_advs = take_vec(reader, "seq_advs", SEQ_ADV_LEN)?;
        let dbrefs = take_vec(reader, "dbrefs", DBREF_LEN)?;
        let ssbonds = take_vec(reader, "ssbonds", SSBOND_LEN)?;
        let beta_sheets = take_vec(reader, "beta_sheets", BETA_SHEET_MIN_LEN)?;
        let alpha_helices = take_vec(reader, "alpha_helices", ALPHA_HELIX_LEN)?;
        let hbonds = take_vec(reader, "hbonds", HBOND_LEN)?;
        let beta_pairs = take_vec(reader, "beta_pairs", BETA_PAIR_LEN)?;
        let length = take_count(reader, "chain length", RESIDUE_LEN)?;
        let atoms = take_vec(reader, "atoms", ATOM_LEN)?;
        let chain_name = take_u8(reader, "chain_name")?;
        let temp_atoms = take_u8(reader, "temp_atoms")?;
        let terminated = take_flag_i32(reader, "terminated")?;
        let temp_residues = take_vec(reader, "temp_residues", TEMP_RESIDUE_LEN)?;
        let secondary_calculated = take_flag_i32(reader, "secondary_calculated")?;
        let residues = take_n(reader, length)?;
        let id_string = take_cstr(reader, "id_string")?;
        let seq_name = take_cstr(reader, "seq name")?;
        let seq = take_bytes(reader, "seq")?;

        Ok(Self {
            cis_peps,
            seq_advs,
            dbrefs,
            ssbonds,
            beta_sheets,
            alpha_helices,
            hbonds,
            beta_pairs,
            atoms,
            chain_name,
            temp_atoms,
            terminated,
            temp_residues,
            secondary_calculated,
            residues,
            id_string,
            seq_name,
            seq,
        })
    }
}
