//! Asset issuance as a resumable, step-by-step workflow.
//!
//! Issuing an asset to a recipient takes seven node interactions: create,
//! wait, mint, wait, resolve the asset id, send, wait. Each call to
//! [`IssuanceWorkflow::advance`] performs exactly one of them and persists
//! the resulting [`IssuanceCheckpoint`] before returning, so a workflow
//! interrupted at any point is resumed from the store with
//! [`IssuanceWorkflow::resume`]. A failed step leaves the checkpoint at the
//! last completed stage and reports which step failed.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use node_rpc::{AssetMetadata, RpcClient};
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::poller::PollPolicy;
use crate::provider::Provider;

/// Where an issuance stands. Each stage carries the identifiers later steps
/// need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum IssuanceStage {
    Pending,
    Created { creation_txid: String },
    CreationConfirmed { creation_txid: String },
    Minted { mint_txid: String },
    MintConfirmed,
    Resolved { asset_id: String },
    Sent { asset_id: String, send_txid: String },
    Completed { asset_id: String, send_txid: String },
}

impl IssuanceStage {
    /// The step that moves this stage forward, `None` once completed.
    pub fn next_step(&self) -> Option<IssuanceStep> {
        match self {
            IssuanceStage::Pending => Some(IssuanceStep::Create),
            IssuanceStage::Created { .. } => Some(IssuanceStep::ConfirmCreation),
            IssuanceStage::CreationConfirmed { .. } => Some(IssuanceStep::Mint),
            IssuanceStage::Minted { .. } => Some(IssuanceStep::ConfirmMint),
            IssuanceStage::MintConfirmed => Some(IssuanceStep::ResolveAssetId),
            IssuanceStage::Resolved { .. } => Some(IssuanceStep::Send),
            IssuanceStage::Sent { .. } => Some(IssuanceStep::ConfirmSend),
            IssuanceStage::Completed { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, IssuanceStage::Completed { .. })
    }
}

impl fmt::Display for IssuanceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssuanceStage::Pending => "pending",
            IssuanceStage::Created { .. } => "created",
            IssuanceStage::CreationConfirmed { .. } => "creation confirmed",
            IssuanceStage::Minted { .. } => "minted",
            IssuanceStage::MintConfirmed => "mint confirmed",
            IssuanceStage::Resolved { .. } => "resolved",
            IssuanceStage::Sent { .. } => "sent",
            IssuanceStage::Completed { .. } => "completed",
        };
        f.write_str(name)
    }
}

/// One node interaction of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStep {
    Create,
    ConfirmCreation,
    Mint,
    ConfirmMint,
    ResolveAssetId,
    Send,
    ConfirmSend,
}

impl fmt::Display for IssuanceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssuanceStep::Create => "create",
            IssuanceStep::ConfirmCreation => "confirm creation",
            IssuanceStep::Mint => "mint",
            IssuanceStep::ConfirmMint => "confirm mint",
            IssuanceStep::ResolveAssetId => "resolve asset id",
            IssuanceStep::Send => "send",
            IssuanceStep::ConfirmSend => "confirm send",
        };
        f.write_str(name)
    }
}

/// Persisted state of one issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceCheckpoint {
    pub metadata: AssetMetadata,
    /// Address that receives the issued asset.
    pub recipient: String,
    #[serde(flatten)]
    pub stage: IssuanceStage,
}

pub trait CheckpointStore {
    fn load(&self) -> Result<Option<IssuanceCheckpoint>, WalletError>;
    fn save(&mut self, checkpoint: &IssuanceCheckpoint) -> Result<(), WalletError>;
}

/// Checkpoint kept as a JSON file.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Option<IssuanceCheckpoint>, WalletError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(WalletError::Storage(e)),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(WalletError::CorruptCheckpoint)
    }

    fn save(&mut self, checkpoint: &IssuanceCheckpoint) -> Result<(), WalletError> {
        let json =
            serde_json::to_vec_pretty(checkpoint).map_err(WalletError::CorruptCheckpoint)?;
        // write-then-rename keeps the previous checkpoint intact on failure
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(WalletError::Storage)?;
        fs::rename(&tmp, &self.path).map_err(WalletError::Storage)
    }
}

pub struct IssuanceWorkflow<'a, C, S> {
    provider: &'a Provider<C>,
    store: S,
    checkpoint: IssuanceCheckpoint,
    policy: PollPolicy,
    /// Step whose result is held in memory but not yet in the store.
    unsaved: Option<IssuanceStep>,
}

impl<'a, C: RpcClient, S: CheckpointStore> IssuanceWorkflow<'a, C, S> {
    /// Begin a new issuance of `metadata` to `recipient`, saving the initial
    /// checkpoint.
    pub fn start(
        provider: &'a Provider<C>,
        mut store: S,
        metadata: AssetMetadata,
        recipient: impl Into<String>,
    ) -> Result<Self, WalletError> {
        let recipient = recipient.into();
        if metadata.name.trim().is_empty() {
            return Err(WalletError::InvalidParameters("asset name is required".into()));
        }
        if recipient.trim().is_empty() {
            return Err(WalletError::InvalidParameters("recipient address is required".into()));
        }
        if metadata.amount == 0 {
            return Err(WalletError::InvalidParameters("amount must be positive".into()));
        }

        let checkpoint = IssuanceCheckpoint {
            metadata,
            recipient,
            stage: IssuanceStage::Pending,
        };
        store.save(&checkpoint)?;

        Ok(Self {
            provider,
            store,
            checkpoint,
            policy: provider.poll_policy(),
            unsaved: None,
        })
    }

    /// Continue an issuance from its saved checkpoint.
    pub fn resume(provider: &'a Provider<C>, store: S) -> Result<Self, WalletError> {
        let checkpoint = store
            .load()?
            .ok_or_else(|| WalletError::InvalidParameters("no issuance checkpoint to resume".into()))?;
        log::info!(
            "resuming issuance of {} at stage {}",
            checkpoint.metadata.name,
            checkpoint.stage
        );
        Ok(Self {
            provider,
            store,
            checkpoint,
            policy: provider.poll_policy(),
            unsaved: None,
        })
    }

    /// Confirmation policy for the three wait steps.
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn stage(&self) -> &IssuanceStage {
        &self.checkpoint.stage
    }

    pub fn checkpoint(&self) -> &IssuanceCheckpoint {
        &self.checkpoint
    }

    /// Perform the next step and persist the stage it reached.
    ///
    /// If the step succeeds on the node but saving fails, the error is
    /// reported against that step and the stage stays advanced in memory.
    /// The next call retries the save before doing anything else, so the
    /// node call is not repeated.
    pub async fn advance(&mut self) -> Result<&IssuanceStage, WalletError> {
        if let Some(step) = self.unsaved {
            self.persist(step)?;
        }
        let Some(step) = self.checkpoint.stage.next_step() else {
            return Ok(&self.checkpoint.stage);
        };

        let next = self
            .perform(step)
            .await
            .map_err(|source| WalletError::Issuance {
                stage: step,
                source: Box::new(source),
            })?;

        self.checkpoint.stage = next;
        self.unsaved = Some(step);
        self.persist(step)?;
        log::info!(
            "issuance of {}: {step} done, now {}",
            self.checkpoint.metadata.name,
            self.checkpoint.stage
        );
        Ok(&self.checkpoint.stage)
    }

    /// Advance until completed; returns the asset id and the send txid.
    pub async fn run_to_completion(&mut self) -> Result<(String, String), WalletError> {
        loop {
            if let IssuanceStage::Completed {
                asset_id,
                send_txid,
            } = self.advance().await?
            {
                return Ok((asset_id.clone(), send_txid.clone()));
            }
        }
    }

    fn persist(&mut self, step: IssuanceStep) -> Result<(), WalletError> {
        self.store
            .save(&self.checkpoint)
            .map_err(|source| WalletError::Issuance {
                stage: step,
                source: Box::new(source),
            })?;
        self.unsaved = None;
        Ok(())
    }

    async fn perform(&self, step: IssuanceStep) -> Result<IssuanceStage, WalletError> {
        let provider = self.provider;
        let metadata = &self.checkpoint.metadata;

        let next = match (&self.checkpoint.stage, step) {
            (IssuanceStage::Pending, IssuanceStep::Create) => IssuanceStage::Created {
                creation_txid: provider.initiate_asset_creation(metadata).await?,
            },
            (IssuanceStage::Created { creation_txid }, IssuanceStep::ConfirmCreation) => {
                provider.wait_for_confirmation(creation_txid, self.policy).await?;
                IssuanceStage::CreationConfirmed {
                    creation_txid: creation_txid.clone(),
                }
            }
            (IssuanceStage::CreationConfirmed { creation_txid }, IssuanceStep::Mint) => {
                IssuanceStage::Minted {
                    mint_txid: provider.mint_created_asset(creation_txid).await?,
                }
            }
            (IssuanceStage::Minted { mint_txid }, IssuanceStep::ConfirmMint) => {
                provider.wait_for_confirmation(mint_txid, self.policy).await?;
                IssuanceStage::MintConfirmed
            }
            (IssuanceStage::MintConfirmed, IssuanceStep::ResolveAssetId) => {
                IssuanceStage::Resolved {
                    asset_id: provider.get_asset_details_by_name(&metadata.name).await?.asset_id,
                }
            }
            (IssuanceStage::Resolved { asset_id }, IssuanceStep::Send) => IssuanceStage::Sent {
                asset_id: asset_id.clone(),
                send_txid: provider
                    .transfer_minted_asset(asset_id, metadata.amount, &self.checkpoint.recipient)
                    .await?,
            },
            (
                IssuanceStage::Sent {
                    asset_id,
                    send_txid,
                },
                IssuanceStep::ConfirmSend,
            ) => {
                provider.wait_for_confirmation(send_txid, self.policy).await?;
                IssuanceStage::Completed {
                    asset_id: asset_id.clone(),
                    send_txid: send_txid.clone(),
                }
            }
            (stage, step) => {
                return Err(WalletError::InvalidParameters(format!(
                    "step {step} does not apply at stage {stage}"
                )))
            }
        };
        Ok(next)
    }
}
