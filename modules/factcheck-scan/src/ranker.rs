use std::collections::HashMap;

use factcheck_common::{Block, Candidate, Flag, PrescreenVerdict};

/// Blocks partitioned by the prescreen: non-claims already resolved to skip
/// flags, claims ordered for investigation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedBlocks {
    pub skipped: Vec<Flag>,
    pub candidates: Vec<Candidate>,
}

/// Split `blocks` into skip flags and ranked candidates.
///
/// Blocks missing from `verdicts` count as non-claims. Candidates are ordered
/// by suspicion rank only; the sort is stable so equal ranks keep block order.
pub fn rank_candidates(blocks: &[Block], verdicts: &[PrescreenVerdict]) -> RankedBlocks {
    let by_id: HashMap<&str, &PrescreenVerdict> =
        verdicts.iter().map(|v| (v.id.as_str(), v)).collect();

    let mut ranked = RankedBlocks::default();
    for block in blocks {
        match by_id.get(block.id.as_str()) {
            Some(verdict) if verdict.is_claim => ranked.candidates.push(Candidate {
                block: block.clone(),
                suspicion: verdict.suspicion.clone(),
                pre_reason: verdict.reason.clone(),
            }),
            Some(verdict) => ranked.skipped.push(Flag::skipped(block, &verdict.reason)),
            None => ranked.skipped.push(Flag::skipped(block, "")),
        }
    }

    ranked.candidates.sort_by_key(|c| c.suspicion.rank());
    ranked
}
