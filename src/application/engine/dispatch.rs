//! Validation and application of a single decoded transaction
//!
//! Each handler either mutates the state and returns the effects recorded on
//! the transaction, or returns the reason the transaction is invalid. A failed
//! handler may leave partial mutations behind; the caller reverts them through
//! the undo log.

use crate::config::{ConsensusParams, EngineConfig};
use crate::domain::errors::ProtocolError;
use crate::domain::models::{
    Crowdsale, CrowdsaleParticipation, CrowdsalePurchase, Ecosystem, OfferAction,
    PropertyId, PropertyKind, PropertyMetadata, StoReceipt, SubSend, TxDetails, UndoLog, UndoOp,
    MAX_TOKENS, PROPERTY_MAIN_TOKEN, PROPERTY_TEST_TOKEN,
};
use crate::domain::services::activation::{FEATURE_FREE_DEX, FEATURE_STO_V1};
use crate::domain::services::payload::{DecodedPayload, Payload};
use crate::domain::services::{
    calculate_purchase, sto, GraceWindow, IssueRequest, OfferTerms, PurchaseInput,
};

use super::state::EngineState;

/// Rules shared by every transaction of a run
pub struct Rules<'a> {
    pub params: &'a ConsensusParams,
    pub config: &'a EngineConfig,
}

/// Where and by whom a transaction was confirmed
#[derive(Debug, Clone)]
pub struct TxContext<'a> {
    pub txid: &'a str,
    pub sender: &'a str,
    pub reference: Option<&'a str>,
    pub block: u32,
    pub block_time: i64,
}

impl TxContext<'_> {
    fn reference(&self) -> Result<&str, ProtocolError> {
        self.reference.ok_or(ProtocolError::MissingReference)
    }
}

pub fn execute(
    state: &mut EngineState,
    rules: &Rules<'_>,
    ctx: &TxContext<'_>,
    decoded: &DecodedPayload,
    undo: &mut UndoLog,
) -> Result<TxDetails, ProtocolError> {
    let payload = &decoded.payload;
    let tx_type = payload.tx_type();
    if !rules.params.is_transaction_type_allowed(
        ctx.block,
        payload.primary_property(),
        tx_type,
        decoded.version,
    ) {
        return Err(ProtocolError::TypeNotPermitted {
            tx_type,
            version: decoded.version,
        });
    }

    match payload {
        Payload::SimpleSend { property, amount } => {
            simple_send(state, rules, ctx, *property, *amount, undo)
        }
        Payload::SendToOwners {
            property,
            amount,
            distribution_property,
        } => send_to_owners(
            state,
            rules,
            ctx,
            *property,
            *amount,
            *distribution_property,
            undo,
        ),
        Payload::SendAll { ecosystem } => send_all(state, ctx, *ecosystem, undo),
        Payload::DexSellOffer {
            property,
            amount,
            desired,
            time_limit,
            min_fee,
            action,
        } => {
            let terms = DexSellTerms {
                amount: *amount,
                desired: *desired,
                time_limit: *time_limit,
                min_fee: *min_fee,
            };
            dex_sell_offer(state, ctx, *property, terms, *action, undo)
        }
        Payload::DexAcceptOffer { property, amount } => {
            let amount = checked_amount(*amount)?;
            state.registry.lookup(*property)?;
            let seller = ctx.reference()?;
            state
                .dex
                .accept(&mut state.ledger, ctx.sender, seller, *property, amount, undo)?;
            Ok(TxDetails::default())
        }
        Payload::CreatePropertyFixed {
            ecosystem,
            property_type,
            previous_property,
            metadata,
            amount,
        } => {
            let (ecosystem, divisible) =
                check_issuance(*ecosystem, *property_type, *previous_property, metadata)?;
            let amount = checked_amount(*amount)?;
            let id = state.registry.issue(
                &mut state.ledger,
                IssueRequest {
                    kind: PropertyKind::Fixed,
                    ecosystem,
                    divisible,
                    issuer: ctx.sender.to_string(),
                    initial_amount: amount,
                    metadata: metadata.clone(),
                    txid: ctx.txid.to_string(),
                    block: ctx.block,
                },
                undo,
            )?;
            Ok(created(id))
        }
        Payload::CreatePropertyVariable {
            ecosystem,
            property_type,
            previous_property,
            metadata,
            desired_property,
            tokens_per_unit,
            deadline,
            early_bonus,
            issuer_percent,
        } => {
            let (ecosystem, divisible) =
                check_issuance(*ecosystem, *property_type, *previous_property, metadata)?;
            state.registry.lookup(*desired_property)?;
            if Ecosystem::of(*desired_property) != Some(ecosystem) {
                return Err(ProtocolError::CrossEcosystem);
            }
            let tokens_per_unit = checked_amount(*tokens_per_unit)?;
            let deadline = i64::try_from(*deadline).unwrap_or(i64::MAX);
            if deadline < ctx.block_time {
                return Err(ProtocolError::DeadlineInPast);
            }
            if state.crowdsales.active_for_issuer(ctx.sender).is_some() {
                return Err(ProtocolError::ActiveCrowdsaleExists);
            }

            let id = state.registry.issue(
                &mut state.ledger,
                IssueRequest {
                    kind: PropertyKind::Crowdsale,
                    ecosystem,
                    divisible,
                    issuer: ctx.sender.to_string(),
                    initial_amount: 0,
                    metadata: metadata.clone(),
                    txid: ctx.txid.to_string(),
                    block: ctx.block,
                },
                undo,
            )?;
            state.crowdsales.create(
                Crowdsale {
                    property_id: id,
                    issuer: ctx.sender.to_string(),
                    desired_property: *desired_property,
                    tokens_per_unit,
                    deadline,
                    early_bonus: *early_bonus,
                    issuer_percent: *issuer_percent,
                    tokens_issued: 0,
                    issuer_tokens: 0,
                    active: true,
                    closed_early: false,
                    max_tokens: false,
                    creation_txid: ctx.txid.to_string(),
                    close_txid: None,
                    close_block: None,
                },
                undo,
            )?;
            Ok(created(id))
        }
        Payload::CloseCrowdsale { property } => {
            state.registry.lookup(*property)?;
            state
                .crowdsales
                .close(ctx.sender, *property, ctx.txid, ctx.block, undo)?;
            Ok(TxDetails::default())
        }
        Payload::CreatePropertyManual {
            ecosystem,
            property_type,
            previous_property,
            metadata,
        } => {
            let (ecosystem, divisible) =
                check_issuance(*ecosystem, *property_type, *previous_property, metadata)?;
            let id = state.registry.issue(
                &mut state.ledger,
                IssueRequest {
                    kind: PropertyKind::Managed,
                    ecosystem,
                    divisible,
                    issuer: ctx.sender.to_string(),
                    initial_amount: 0,
                    metadata: metadata.clone(),
                    txid: ctx.txid.to_string(),
                    block: ctx.block,
                },
                undo,
            )?;
            Ok(created(id))
        }
        Payload::GrantTokens {
            property, amount, ..
        } => {
            let amount = checked_amount(*amount)?;
            let recipient = ctx.reference.unwrap_or(ctx.sender);
            state.registry.grant(
                &mut state.ledger,
                ctx.sender,
                *property,
                amount,
                recipient,
                undo,
            )?;
            Ok(TxDetails::default())
        }
        Payload::RevokeTokens {
            property, amount, ..
        } => {
            let amount = checked_amount(*amount)?;
            state
                .registry
                .revoke(&mut state.ledger, ctx.sender, *property, amount, undo)?;
            Ok(TxDetails::default())
        }
        Payload::Deactivation { feature_id } => {
            check_authority(rules, ctx)?;
            state.activations.deactivate(*feature_id, undo)?;
            Ok(TxDetails::default())
        }
        Payload::Activation {
            feature_id,
            activation_block,
            min_client_version,
        } => {
            check_authority(rules, ctx)?;
            let window = GraceWindow {
                min: rules.params.min_activation_blocks,
                max: rules.params.max_activation_blocks,
            };
            state.activations.activate(
                *feature_id,
                *activation_block,
                *min_client_version,
                ctx.block,
                window,
                ctx.txid,
                undo,
            )?;
            Ok(TxDetails::default())
        }
    }
}

/// Raw amounts must be positive and fit the supply ceiling
fn checked_amount(raw: u64) -> Result<i64, ProtocolError> {
    match i64::try_from(raw) {
        Ok(amount) if amount > 0 && amount <= MAX_TOKENS => Ok(amount),
        _ => Err(ProtocolError::InvalidAmount),
    }
}

fn created(id: PropertyId) -> TxDetails {
    TxDetails {
        created_property: Some(id),
        ..TxDetails::default()
    }
}

fn check_issuance(
    ecosystem: u8,
    property_type: u16,
    previous_property: PropertyId,
    metadata: &PropertyMetadata,
) -> Result<(Ecosystem, bool), ProtocolError> {
    let ecosystem = Ecosystem::from_u8(ecosystem).ok_or(ProtocolError::InvalidEcosystem)?;
    let divisible = match property_type {
        1 => false,
        2 => true,
        _ => return Err(ProtocolError::InvalidPropertyType),
    };
    if previous_property != 0 {
        return Err(ProtocolError::UnsupportedPreviousProperty);
    }
    if metadata.name.is_empty() {
        return Err(ProtocolError::EmptyName);
    }
    Ok((ecosystem, divisible))
}

fn check_authority(rules: &Rules<'_>, ctx: &TxContext<'_>) -> Result<(), ProtocolError> {
    if rules.config.is_activation_sender_allowed(ctx.sender) {
        Ok(())
    } else {
        Err(ProtocolError::UnauthorizedSender)
    }
}

fn simple_send(
    state: &mut EngineState,
    rules: &Rules<'_>,
    ctx: &TxContext<'_>,
    property: PropertyId,
    amount: u64,
    undo: &mut UndoLog,
) -> Result<TxDetails, ProtocolError> {
    let amount = checked_amount(amount)?;
    state.registry.lookup(property)?;
    let recipient = ctx.reference()?;

    state.ledger.debit(ctx.sender, property, amount, undo)?;
    state.ledger.credit(recipient, property, amount, undo)?;

    let sale = match state.crowdsales.contribution_target(recipient, property) {
        Some(sale) if sale.issuer != ctx.sender => sale.clone(),
        _ => return Ok(TxDetails::default()),
    };

    let sale_property = state.registry.lookup(sale.property_id)?;
    let quote = calculate_purchase(PurchaseInput {
        amount_paid: amount,
        desired_divisible: state.registry.is_divisible(property),
        tokens_per_unit: sale.tokens_per_unit,
        early_bonus: sale.early_bonus,
        issuer_percent: sale.issuer_percent,
        deadline: sale.deadline,
        block_time: ctx.block_time,
        bonus_period_secs: rules.config.crowdsale_bonus_period_secs,
        total_tokens: sale_property.total_tokens,
    });
    // a contribution against a full sale still closes it
    if !quote.reached_cap && quote.participant_tokens == 0 && quote.issuer_tokens == 0 {
        return Ok(TxDetails::default());
    }

    if quote.participant_tokens > 0 {
        state.registry.mint(
            &mut state.ledger,
            ctx.sender,
            sale.property_id,
            quote.participant_tokens,
            undo,
        )?;
    }
    if quote.issuer_tokens > 0 {
        state.registry.mint(
            &mut state.ledger,
            &sale.issuer,
            sale.property_id,
            quote.issuer_tokens,
            undo,
        )?;
    }
    state.crowdsales.record_purchase(
        sale.property_id,
        quote,
        CrowdsaleParticipation {
            txid: ctx.txid.to_string(),
            block: ctx.block,
            participant: ctx.sender.to_string(),
            amount_paid: amount,
            participant_tokens: quote.participant_tokens,
            issuer_tokens: quote.issuer_tokens,
        },
        undo,
    )?;

    Ok(TxDetails {
        purchase: Some(CrowdsalePurchase {
            property_id: sale.property_id,
            tokens: quote.participant_tokens,
            issuer_tokens: quote.issuer_tokens,
        }),
        ..TxDetails::default()
    })
}

fn send_to_owners(
    state: &mut EngineState,
    rules: &Rules<'_>,
    ctx: &TxContext<'_>,
    property: PropertyId,
    amount: u64,
    distribution_property: Option<PropertyId>,
    undo: &mut UndoLog,
) -> Result<TxDetails, ProtocolError> {
    if distribution_property.is_some() && !state.activations.is_active(FEATURE_STO_V1) {
        return Err(ProtocolError::FeatureNotActivated(FEATURE_STO_V1));
    }
    let amount = checked_amount(amount)?;
    let ecosystem = state.registry.lookup(property)?.ecosystem;
    let distribution_property = distribution_property.unwrap_or(property);
    state.registry.lookup(distribution_property)?;

    if state.ledger.available(ctx.sender, property) < amount {
        return Err(ProtocolError::InsufficientBalance);
    }

    let owners = sto::eligible_owners(state.ledger.holders(distribution_property), ctx.sender);
    let recipients = sto::distribute(&owners, amount);
    if recipients.is_empty() {
        return Err(ProtocolError::NoRecipients);
    }

    let fee_property = ecosystem.protocol_token();
    let fee = sto::distribution_fee(rules.config.sto_fee_per_recipient, recipients.len());
    let needed_for_fee = if fee_property == property {
        i128::from(amount) + i128::from(fee)
    } else {
        i128::from(fee)
    };
    if i128::from(state.ledger.available(ctx.sender, fee_property)) < needed_for_fee {
        return Err(ProtocolError::InsufficientFee);
    }

    state.ledger.debit(ctx.sender, property, amount, undo)?;
    for recipient in &recipients {
        state
            .ledger
            .credit(&recipient.address, property, recipient.amount, undo)?;
    }
    if fee > 0 {
        state
            .registry
            .burn(&mut state.ledger, ctx.sender, fee_property, fee, undo)?;
    }

    let recipient_count = recipients.len();
    state.sto_receipts.insert(
        ctx.txid.to_string(),
        StoReceipt {
            txid: ctx.txid.to_string(),
            sender: ctx.sender.to_string(),
            block: ctx.block,
            property_id: property,
            distribution_property,
            amount,
            fee_property,
            fee,
            recipients,
        },
    );
    undo.push(UndoOp::StoReceipt {
        txid: ctx.txid.to_string(),
    });

    Ok(TxDetails {
        sto_recipients: Some(recipient_count),
        sto_fee: Some(fee),
        ..TxDetails::default()
    })
}

fn send_all(
    state: &mut EngineState,
    ctx: &TxContext<'_>,
    ecosystem: u8,
    undo: &mut UndoLog,
) -> Result<TxDetails, ProtocolError> {
    let ecosystem = Ecosystem::from_u8(ecosystem).ok_or(ProtocolError::InvalidEcosystem)?;
    let recipient = ctx.reference()?;

    let moves = state.ledger.available_in_ecosystem(ctx.sender, ecosystem);
    if moves.is_empty() {
        return Err(ProtocolError::NothingToSend);
    }

    let mut sub_sends = Vec::with_capacity(moves.len());
    for (property_id, amount) in moves {
        state.ledger.debit(ctx.sender, property_id, amount, undo)?;
        state.ledger.credit(recipient, property_id, amount, undo)?;
        sub_sends.push(SubSend {
            property_id,
            amount,
        });
    }

    Ok(TxDetails {
        sub_sends,
        ..TxDetails::default()
    })
}

struct DexSellTerms {
    amount: u64,
    desired: u64,
    time_limit: u8,
    min_fee: u64,
}

fn dex_sell_offer(
    state: &mut EngineState,
    ctx: &TxContext<'_>,
    property: PropertyId,
    terms: DexSellTerms,
    action: OfferAction,
    undo: &mut UndoLog,
) -> Result<TxDetails, ProtocolError> {
    state.registry.lookup(property)?;
    let protocol_token = property == PROPERTY_MAIN_TOKEN || property == PROPERTY_TEST_TOKEN;
    if !protocol_token && !state.activations.is_active(FEATURE_FREE_DEX) {
        return Err(ProtocolError::PropertyNotTradeable(property));
    }

    let offer_terms = || -> Result<OfferTerms, ProtocolError> {
        Ok(OfferTerms {
            amount: checked_amount(terms.amount)?,
            desired: checked_amount(terms.desired)?,
            time_limit: terms.time_limit,
            min_fee: i64::try_from(terms.min_fee).map_err(|_| ProtocolError::InvalidAmount)?,
            txid: ctx.txid.to_string(),
            block: ctx.block,
        })
    };

    match action {
        OfferAction::New => {
            let offer = offer_terms()?;
            state
                .dex
                .create(&mut state.ledger, ctx.sender, property, offer, undo)?
        }
        OfferAction::Update => {
            let offer = offer_terms()?;
            state
                .dex
                .update(&mut state.ledger, ctx.sender, property, offer, undo)?
        }
        OfferAction::Cancel => state
            .dex
            .cancel(&mut state.ledger, ctx.sender, property, undo)?,
    }
    Ok(TxDetails::default())
}
