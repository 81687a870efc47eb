//! Bin-packing utilities for chunk-to-domain assignment.
//!
//! Chunks are streamed in their canonical global order into `k` target
//! domains, each chunk joining whichever domain currently has the smallest
//! running element count. Domains are then dealt out to participants.

use crate::mesh_error::MeshError;

/// An item to be packed into one of `k` parts.
///
/// - `cid`: Chunk ID (global index).
/// - `load`: The load or weight of the chunk (element count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub cid: usize,
    pub load: u64,
}

/// Assigns each item to one of `k` parts, streaming in slice order.
///
/// Each item goes to the part with the smallest running load (lowest part
/// index on ties). The result is order-dependent and deterministic.
///
/// # Errors
/// Returns `MeshError::InvalidTarget` if `k == 0` and there is anything to pack.
pub fn greedy_balance(items: &[Item], k: usize) -> Result<Vec<usize>, MeshError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    if k == 0 {
        return Err(MeshError::InvalidTarget);
    }
    let mut loads = vec![0u64; k];
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        // `min_by_key` keeps the first minimum, i.e. the lowest part index.
        let (part, _) = loads
            .iter()
            .enumerate()
            .min_by_key(|&(_, &w)| w)
            .ok_or(MeshError::InvalidTarget)?;
        loads[part] += item.load;
        parts.push(part);
        log::debug!(
            "chunk {} -> domain {part} (running total {})",
            item.cid,
            loads[part]
        );
    }
    Ok(parts)
}

/// Total load per part for an assignment.
pub fn part_loads(items: &[Item], parts: &[usize], k: usize) -> Vec<u64> {
    let mut loads = vec![0u64; k];
    for (item, &p) in items.iter().zip(parts) {
        loads[p] += item.load;
    }
    loads
}

/// Participant owning each of `num_domains` domains.
///
/// Domains are dealt round-robin over the `min(participants, num_domains)`
/// lowest participants: participant `p` receives `p, p + d, p + 2d, ...`.
pub fn domain_owners(num_domains: usize, participants: usize) -> Vec<usize> {
    let divisor = participants.min(num_domains).max(1);
    (0..num_domains).map(|d| d % divisor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn items(loads: &[u64]) -> Vec<Item> {
        loads
            .iter()
            .enumerate()
            .map(|(cid, &load)| Item { cid, load })
            .collect()
    }

    #[test]
    fn streams_in_order() {
        let it = items(&[10, 20, 5, 15]);
        let parts = greedy_balance(&it, 2).unwrap();
        // 10->0, 20->1, 5->0 (10<20), 15->0 (15<20)
        assert_eq!(parts, vec![0, 1, 0, 0]);
        assert_eq!(part_loads(&it, &parts, 2), vec![30, 20]);
    }

    #[test]
    fn ties_prefer_lowest_part() {
        let parts = greedy_balance(&items(&[4, 4, 4, 4]), 3).unwrap();
        assert_eq!(parts, vec![0, 1, 2, 0]);
    }

    #[test]
    fn more_parts_than_items() {
        let parts = greedy_balance(&items(&[7, 3]), 5).unwrap();
        assert_eq!(parts, vec![0, 1]);
    }

    #[test]
    fn zero_target_rejected() {
        assert!(matches!(
            greedy_balance(&items(&[1]), 0),
            Err(MeshError::InvalidTarget)
        ));
        assert!(greedy_balance(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn owners_round_robin() {
        assert_eq!(domain_owners(5, 2), vec![0, 1, 0, 1, 0]);
        assert_eq!(domain_owners(2, 4), vec![0, 1]);
        assert!(domain_owners(0, 3).is_empty());
    }

    proptest! {
        #[test]
        fn conservation(loads in proptest::collection::vec(0u64..1000, 0..40), k in 1usize..8) {
            let it = items(&loads);
            let parts = greedy_balance(&it, k).unwrap();
            prop_assert_eq!(parts.len(), it.len());
            prop_assert!(parts.iter().all(|&p| p < k));
            let per_part = part_loads(&it, &parts, k);
            prop_assert_eq!(per_part.iter().sum::<u64>(), loads.iter().sum::<u64>());
        }

        #[test]
        fn owners_in_range(domains in 0usize..50, participants in 1usize..9) {
            let owners = domain_owners(domains, participants);
            prop_assert_eq!(owners.len(), domains);
            prop_assert!(owners.iter().all(|&r| r < participants.min(domains.max(1))));
        }
    }
}
