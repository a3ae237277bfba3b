//! # Epoch Proposal Coordinator
//!
//! Brings the registry's epoch into consensus state in three phases:
//!
//! ```text
//! propose (proposer only)     verify (every node)          commit (every node)
//! ───────────────────────     ───────────────────          ───────────────────
//! local epoch + registry  ──► claim >= committed? ──Accept─► persist claim
//! prepend EPC1 claim          malformed/regress ──Reject
//! ```
//!
//! Only the propose phase depends on non-deterministic input; verify and
//! commit depend solely on the block payload and committed state. Heights
//! that are not epoch boundaries pass through all phases untouched.

use super::claim::EpochClaim;
use crate::error::{EpochSyncError, EpochSyncResult};
use crate::types::Params;
use shared_types::{Epoch, Height};

/// Vote on a proposed block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalStatus {
    Accept,
    Reject,
}

/// Stateless three-phase logic; state access lives in the service.
pub struct EpochProposalCoordinator;

impl EpochProposalCoordinator {
    /// Epoch to claim given the locally committed epoch and the registry's
    /// lowest committed epoch. Never regresses.
    pub fn choose_epoch(local: Epoch, registry: Option<Epoch>) -> Epoch {
        match registry {
            Some(latest) if latest > local => latest,
            _ => local,
        }
    }

    /// Prepend the encoded claim to the proposer's payload.
    pub fn inject_claim(claim: EpochClaim, txs: Vec<Vec<u8>>) -> EpochSyncResult<Vec<Vec<u8>>> {
        let encoded = claim
            .encode()
            .map_err(|reason| EpochSyncError::InvalidClaim { reason })?;
        let mut out = Vec::with_capacity(txs.len() + 1);
        out.push(encoded);
        out.extend(txs);
        Ok(out)
    }

    /// The leading item of `txs` if this block is expected to carry a claim.
    fn leading_claim<'a>(params: &Params, height: Height, txs: &'a [Vec<u8>]) -> Option<&'a [u8]> {
        if !params.is_epoch_boundary(height) {
            return None;
        }
        txs.first()
            .map(Vec::as_slice)
            .filter(|tx| EpochClaim::is_claim(tx))
    }

    /// Verify phase.
    pub fn verify(
        params: &Params,
        height: Height,
        txs: &[Vec<u8>],
        committed: Epoch,
    ) -> ProposalStatus {
        let Some(raw) = Self::leading_claim(params, height, txs) else {
            return ProposalStatus::Accept;
        };

        let claim = match EpochClaim::decode(raw) {
            Ok(claim) => claim,
            Err(e) => {
                tracing::error!(
                    "[sc-01] ProcessProposal: failed to decode injected epoch claim at height {}: {}",
                    height,
                    e
                );
                return ProposalStatus::Reject;
            }
        };

        if claim.epoch < committed {
            tracing::error!(
                "[sc-01] ProcessProposal: invalid epoch number at height {}: expected >= {}, got {}",
                height,
                committed,
                claim.epoch
            );
            return ProposalStatus::Reject;
        }

        ProposalStatus::Accept
    }

    /// Commit phase: the claim to persist, if any.
    ///
    /// A malformed claim here means an accepted block fails to decode, which
    /// is an error rather than a silent skip.
    pub fn claim_to_commit(
        params: &Params,
        height: Height,
        txs: &[Vec<u8>],
    ) -> EpochSyncResult<Option<EpochClaim>> {
        match Self::leading_claim(params, height, txs) {
            None => Ok(None),
            Some(raw) => EpochClaim::decode(raw)
                .map(Some)
                .map_err(|reason| EpochSyncError::InvalidClaim { reason }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_tx(epoch: Epoch) -> Vec<u8> {
        EpochClaim::new(epoch).encode().unwrap()
    }

    #[test]
    fn test_choose_epoch_never_regresses() {
        assert_eq!(EpochProposalCoordinator::choose_epoch(0, Some(5)), 5);
        assert_eq!(EpochProposalCoordinator::choose_epoch(7, Some(5)), 7);
        assert_eq!(EpochProposalCoordinator::choose_epoch(7, Some(7)), 7);
        assert_eq!(EpochProposalCoordinator::choose_epoch(7, None), 7);
    }

    #[test]
    fn test_inject_claim_goes_first() {
        let txs = EpochProposalCoordinator::inject_claim(
            EpochClaim::new(3),
            vec![b"tx1".to_vec(), b"tx2".to_vec()],
        )
        .unwrap();
        assert_eq!(txs.len(), 3);
        assert_eq!(EpochClaim::decode(&txs[0]).unwrap().epoch, 3);
        assert_eq!(txs[1], b"tx1".to_vec());
    }

    #[test]
    fn test_verify_monotonicity_for_all_pairs() {
        let params = Params::default();
        for committed in 0..20u64 {
            for claimed in 0..20u64 {
                let status =
                    EpochProposalCoordinator::verify(&params, 10, &[claim_tx(claimed)], committed);
                let expected = if claimed < committed {
                    ProposalStatus::Reject
                } else {
                    ProposalStatus::Accept
                };
                assert_eq!(status, expected, "committed={committed} claimed={claimed}");
            }
        }
    }

    #[test]
    fn test_verify_pass_through() {
        let params = Params::default();
        // Off-boundary: even a regressing claim is not inspected.
        assert_eq!(
            EpochProposalCoordinator::verify(&params, 11, &[claim_tx(0)], 9),
            ProposalStatus::Accept
        );
        // Boundary, no payload.
        assert_eq!(
            EpochProposalCoordinator::verify(&params, 10, &[], 9),
            ProposalStatus::Accept
        );
        // Boundary, proposer could not reach the registry.
        assert_eq!(
            EpochProposalCoordinator::verify(&params, 10, &[b"tx".to_vec()], 9),
            ProposalStatus::Accept
        );
    }

    #[test]
    fn test_verify_rejects_malformed_claim() {
        let params = Params::default();
        let mut bad = claim_tx(5);
        bad.push(0xff);
        assert_eq!(
            EpochProposalCoordinator::verify(&params, 10, &[bad], 0),
            ProposalStatus::Reject
        );
        assert_eq!(
            EpochProposalCoordinator::verify(&params, 10, &[b"EPC1".to_vec()], 0),
            ProposalStatus::Reject
        );
    }

    #[test]
    fn test_claim_to_commit() {
        let params = Params::default();
        let txs = vec![claim_tx(5), b"tx".to_vec()];

        assert_eq!(
            EpochProposalCoordinator::claim_to_commit(&params, 20, &txs).unwrap(),
            Some(EpochClaim::new(5))
        );
        assert_eq!(
            EpochProposalCoordinator::claim_to_commit(&params, 21, &txs).unwrap(),
            None
        );
        assert!(matches!(
            EpochProposalCoordinator::claim_to_commit(&params, 20, &[b"EPC1".to_vec()]),
            Err(EpochSyncError::InvalidClaim { .. })
        ));
    }
}
