//! Packed state representation: a fluent-atom
//! bitset, a derived-atom bitset, and a dense numeric-function value
//! array. The state repository serializes this form into its arena for
//! content addressing.

use fixedbitset::FixedBitSet;
use mimir_collections::define_index;

define_index! {
    /// Dense index of a distinct packed state, assigned by the state
    /// repository in first-encounter order.
    pub struct StateIndex;
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PackedState {
    pub fluent_atoms: FixedBitSet,
    pub derived_atoms: FixedBitSet,
    pub numeric_values: Vec<f64>,
}

impl PackedState {
    pub fn new(num_fluent_atoms: usize, num_derived_atoms: usize, num_numeric_values: usize) -> Self {
        PackedState {
            fluent_atoms: FixedBitSet::with_capacity(num_fluent_atoms),
            derived_atoms: FixedBitSet::with_capacity(num_derived_atoms),
            numeric_values: vec![0.0; num_numeric_values],
        }
    }

    /// Serializes to the byte form the state repository hashes and
    /// deduplicates on. Bit positions are stored as sorted index lists
    /// rather than raw words so the wire form does not depend on the
    /// bitset crate's internal block layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_bitset(&mut bytes, &self.fluent_atoms);
        write_bitset(&mut bytes, &self.derived_atoms);
        bytes.extend_from_slice(&(self.numeric_values.len() as u32).to_le_bytes());
        for v in &self.numeric_values {
            bytes.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut offset = 0;
        let fluent_atoms = read_bitset(bytes, &mut offset);
        let derived_atoms = read_bitset(bytes, &mut offset);
        let num_numeric = read_u32(bytes, &mut offset) as usize;
        let mut numeric_values = Vec::with_capacity(num_numeric);
        for _ in 0..num_numeric {
            numeric_values.push(f64::from_bits(read_u64(bytes, &mut offset)));
        }
        PackedState {
            fluent_atoms,
            derived_atoms,
            numeric_values,
        }
    }
}

fn write_bitset(bytes: &mut Vec<u8>, bitset: &FixedBitSet) {
    bytes.extend_from_slice(&(bitset.len() as u32).to_le_bytes());
    let ones: Vec<u32> = bitset.ones().map(|b| b as u32).collect();
    bytes.extend_from_slice(&(ones.len() as u32).to_le_bytes());
    for bit in ones {
        bytes.extend_from_slice(&bit.to_le_bytes());
    }
}

fn read_bitset(bytes: &[u8], offset: &mut usize) -> FixedBitSet {
    let capacity = read_u32(bytes, offset) as usize;
    let count = read_u32(bytes, offset) as usize;
    let mut bitset = FixedBitSet::with_capacity(capacity);
    for _ in 0..count {
        bitset.insert(read_u32(bytes, offset) as usize);
    }
    bitset
}

fn read_u32(bytes: &[u8], offset: &mut usize) -> u32 {
    let value = u32::from_le_bytes(bytes[*offset..*offset + 4].try_into().unwrap());
    *offset += 4;
    value
}

fn read_u64(bytes: &[u8], offset: &mut usize) -> u64 {
    let value = u64::from_le_bytes(bytes[*offset..*offset + 8].try_into().unwrap());
    *offset += 8;
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let mut state = PackedState::new(10, 4, 2);
        state.fluent_atoms.insert(1);
        state.fluent_atoms.insert(7);
        state.derived_atoms.insert(2);
        state.numeric_values[0] = 3.5;
        state.numeric_values[1] = -1.0;

        let bytes = state.to_bytes();
        let decoded = PackedState::from_bytes(&bytes);
        assert_eq!(state, decoded);
    }

    #[test]
    fn byte_equal_states_are_equal() {
        let mut a = PackedState::new(5, 5, 0);
        let mut b = PackedState::new(5, 5, 0);
        a.fluent_atoms.insert(3);
        b.fluent_atoms.insert(3);
        assert_eq!(a.to_bytes(), b.to_bytes());
    }
}
