//! Collateral movement between the venue's ledgers.
//!
//! Requests are prepared in quantum units with the checks the venue cannot
//! do for us: exact precision, positive amounts, and fully specified ends.
//! Partial destinations are unrepresentable for subaccount transfers, since
//! the constructors take [`Subaccount`] values, which always carry a
//! number. Withdrawals intentionally route to the bare wallet address.

use fastnum::UD128;

use crate::{
    num::{QuantumError, Quantizer},
    types::{AssetId, Subaccount, SubaccountNumber},
};

/// One end of a transfer: a wallet address, optionally narrowed to one of
/// its subaccounts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountRef {
    address: String,
    subaccount_number: Option<SubaccountNumber>,
}

impl AccountRef {
    /// Bare wallet address, not narrowed to a subaccount.
    pub fn wallet(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            subaccount_number: None,
        }
    }

    /// Fully specified subaccount.
    pub fn subaccount(subaccount: &Subaccount) -> Self {
        Self {
            address: subaccount.address().to_string(),
            subaccount_number: Some(subaccount.number()),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn subaccount_number(&self) -> Option<SubaccountNumber> {
        self.subaccount_number
    }
}

/// Deposit, withdrawal, or subaccount-to-subaccount transfer with the
/// amount already converted to quantum units.
#[derive(Clone, Debug)]
pub struct TransferRequest {
    asset_id: AssetId,
    amount_quantums: u64,
    source: AccountRef,
    destination: AccountRef,
}

impl TransferRequest {
    /// Move collateral from the wallet into one of its subaccounts.
    pub fn deposit(
        quantizer: Quantizer,
        asset_id: AssetId,
        subaccount: &Subaccount,
        amount: UD128,
    ) -> Result<Self, QuantumError> {
        Ok(Self {
            asset_id,
            amount_quantums: checked_quantums(quantizer, amount)?,
            source: AccountRef::wallet(subaccount.address()),
            destination: AccountRef::subaccount(subaccount),
        })
    }

    /// Move collateral from a subaccount back to its owning wallet. The
    /// destination carries no subaccount number.
    pub fn withdrawal(
        quantizer: Quantizer,
        asset_id: AssetId,
        subaccount: &Subaccount,
        amount: UD128,
    ) -> Result<Self, QuantumError> {
        Ok(Self {
            asset_id,
            amount_quantums: checked_quantums(quantizer, amount)?,
            source: AccountRef::subaccount(subaccount),
            destination: AccountRef::wallet(subaccount.address()),
        })
    }

    /// Move collateral between two subaccounts, possibly under different
    /// wallets. Both ends are fully specified by construction.
    pub fn between_subaccounts(
        quantizer: Quantizer,
        asset_id: AssetId,
        from: &Subaccount,
        to: &Subaccount,
        amount: UD128,
    ) -> Result<Self, QuantumError> {
        Ok(Self {
            asset_id,
            amount_quantums: checked_quantums(quantizer, amount)?,
            source: AccountRef::subaccount(from),
            destination: AccountRef::subaccount(to),
        })
    }

    /// Asset being moved.
    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// Amount in quantum units, rounded from the decimal amount with no
    /// precision loss.
    pub fn amount_quantums(&self) -> u64 {
        self.amount_quantums
    }

    pub fn source(&self) -> &AccountRef {
        &self.source
    }

    pub fn destination(&self) -> &AccountRef {
        &self.destination
    }
}

fn checked_quantums(quantizer: Quantizer, amount: UD128) -> Result<u64, QuantumError> {
    if amount == UD128::ZERO {
        return Err(QuantumError::NegativeAmount(amount.to_string()));
    }
    quantizer.to_quantums(amount)
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    fn quantizer() -> Quantizer {
        Quantizer::new(6)
    }

    #[test]
    fn test_deposit_converts_to_quantums() {
        let subaccount = Subaccount::new("wallet1", 0);
        let request =
            TransferRequest::deposit(quantizer(), 0, &subaccount, udec128!(1.23)).unwrap();

        assert_eq!(request.amount_quantums(), 1_230_000);
        assert_eq!(request.source(), &AccountRef::wallet("wallet1"));
        assert_eq!(request.destination(), &AccountRef::subaccount(&subaccount));
    }

    #[test]
    fn test_withdrawal_destination_has_no_subaccount() {
        let subaccount = Subaccount::new("wallet1", 2);
        let request =
            TransferRequest::withdrawal(quantizer(), 0, &subaccount, udec128!(5)).unwrap();

        assert_eq!(request.source().subaccount_number(), Some(2));
        assert_eq!(request.destination().subaccount_number(), None);
        assert_eq!(request.destination().address(), "wallet1");
    }

    #[test]
    fn test_between_subaccounts_fully_specified() {
        let from = Subaccount::new("wallet1", 0);
        let to = Subaccount::new("wallet2", 1);
        let request =
            TransferRequest::between_subaccounts(quantizer(), 0, &from, &to, udec128!(10)).unwrap();

        assert_eq!(request.source().subaccount_number(), Some(0));
        assert_eq!(request.destination().subaccount_number(), Some(1));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let subaccount = Subaccount::new("wallet1", 0);
        assert!(matches!(
            TransferRequest::deposit(quantizer(), 0, &subaccount, UD128::ZERO),
            Err(QuantumError::NegativeAmount(_))
        ));
        assert!(matches!(
            TransferRequest::withdrawal(quantizer(), 0, &subaccount, UD128::ZERO),
            Err(QuantumError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_precision_loss_propagates() {
        let subaccount = Subaccount::new("wallet1", 0);
        assert!(matches!(
            TransferRequest::deposit(quantizer(), 0, &subaccount, udec128!(1.2345678)),
            Err(QuantumError::PrecisionLoss { .. })
        ));
    }
}
