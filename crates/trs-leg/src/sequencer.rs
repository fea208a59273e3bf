//! Period-by-period payment sequencing.
//!
//! [`PaymentSequencer`] walks the valuation schedule in lock-step with the
//! notional-change feed and yields payments in settlement order. It is a
//! one-shot iterator: a pass ends when the schedule is exhausted, on a
//! credit default (after one final truncated price return), or once the
//! underlying is fully redeemed.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use tracing::{debug, trace};
use trs_core::types::{Date, NotionalChange};

use crate::balance::balance_at;
use crate::error::{LegError, LegResult};
use crate::leg::ReturnLeg;
use crate::payments::{Payment, PriceReturnPayment, ReferenceAmountPayment};
use crate::scale::ScaleComposer;

/// Lazy producer of a leg's price-return and reference-amount payments.
#[derive(Debug)]
pub struct PaymentSequencer<'a> {
    leg: &'a ReturnLeg,
    composer: ScaleComposer,
    from_date: Date,
    period: usize,
    begin: Date,
    last_pay_date: Date,
    cursor: usize,
    pending: VecDeque<Payment>,
    done: bool,
}

impl<'a> PaymentSequencer<'a> {
    /// Starts a pass over `leg`, emitting only payments settling after `from_date`.
    pub fn new(leg: &'a ReturnLeg, from_date: Date) -> Self {
        let effective = leg.effective_date();
        let (balance, cursor) = balance_at(leg.notional_changes().as_slice(), effective, 0);
        let done = balance <= 0.0;
        if done {
            debug!(%effective, balance, "underlying not funded, no payments");
        }

        Self {
            leg,
            composer: leg.scale_composer(),
            from_date,
            period: 0,
            begin: effective,
            last_pay_date: effective,
            cursor,
            pending: VecDeque::new(),
            done,
        }
    }

    /// Number of valuation periods processed so far.
    pub fn periods_processed(&self) -> usize {
        self.period
    }

    /// Position in the notional-change feed.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn changes(&self) -> &'a [NotionalChange] {
        self.leg.notional_changes().as_slice()
    }

    fn begin_price_override(&self) -> Option<f64> {
        (self.period == 0).then(|| self.leg.initial_price())
    }

    fn price_return(&self, end_pay_date: Date, accrual_end: Date, balance: f64) -> Payment {
        let payment = PriceReturnPayment::new(
            self.last_pay_date,
            end_pay_date,
            self.leg.currency(),
            self.begin,
            accrual_end,
            self.leg.price_calculator().clone(),
            self.begin_price_override(),
            self.leg.resetting_notional(),
        );
        self.composer
            .scale_by(payment.into(), self.leg.notional_units(balance))
    }

    fn reference_amount(&self, change: &NotionalChange) -> Payment {
        let initial_price = self.leg.initial_price();
        ReferenceAmountPayment::new(
            change.date,
            self.leg.currency(),
            change.notional_before / initial_price,
            (change.notional_before - change.notional_after) / initial_price,
            self.begin,
            self.leg.price_calculator().clone(),
            self.begin_price_override(),
        )
        .with_credit_risk_end_date(change.credit_risk_end_date)
        .into()
    }

    /// Processes one valuation period, queueing its payments.
    fn step(&mut self) -> LegResult<()> {
        let schedule = self.leg.schedule();
        if self.period >= schedule.len() {
            self.done = true;
            return Ok(());
        }

        let date = schedule.value_date(self.period);
        let pay_date = schedule.payment_date(self.period);
        if date <= self.begin {
            return Err(LegError::ScheduleOutOfOrder {
                period: self.period + 1,
                date: date.to_string(),
                previous: self.begin.to_string(),
            });
        }
        if pay_date < self.last_pay_date {
            return Err(LegError::ScheduleOutOfOrder {
                period: self.period + 1,
                date: pay_date.to_string(),
                previous: self.last_pay_date.to_string(),
            });
        }

        if let Some(settle) = self.leg.default_settle_date() {
            if settle <= pay_date {
                let (balance, cursor) = balance_at(self.changes(), settle, self.cursor);
                self.cursor = cursor;
                let accrual_end = settle + self.leg.config().default_accrual_lag_days;
                debug!(
                    period = self.period + 1,
                    %settle,
                    balance,
                    "credit default, truncating payment sequence"
                );
                let payment = self.price_return(settle, accrual_end, balance);
                self.pending.push_back(payment);
                self.done = true;
                return Ok(());
            }
        }

        let last_index = self.cursor;
        let (balance, cursor) = balance_at(self.changes(), pay_date, self.cursor);
        self.cursor = cursor;
        trace!(
            period = self.period + 1,
            %date,
            %pay_date,
            balance,
            cursor,
            "valuation period"
        );

        if self.from_date >= pay_date {
            if balance <= 0.0 {
                debug!(%pay_date, "underlying redeemed before from date");
                self.done = true;
                return Ok(());
            }
        } else {
            if balance < -self.leg.config().balance_tolerance {
                return Err(LegError::NegativeBalance {
                    date: pay_date.to_string(),
                    balance,
                });
            }

            let changes = self.changes();
            for change in &changes[last_index..cursor] {
                let payment = self.reference_amount(change);
                self.pending.push_back(payment);
            }

            if balance <= 0.0 {
                debug!(%pay_date, "underlying fully redeemed");
                self.done = true;
                return Ok(());
            }

            let payment = self.price_return(pay_date, date, balance);
            self.pending.push_back(payment);
        }

        self.last_pay_date = pay_date;
        self.begin = date;
        self.period += 1;
        Ok(())
    }
}

impl Iterator for PaymentSequencer<'_> {
    type Item = LegResult<Payment>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(payment) = self.pending.pop_front() {
                return Some(Ok(payment));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.step() {
                self.done = true;
                self.pending.clear();
                return Some(Err(e));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (self.pending.len(), Some(self.pending.len()))
        } else {
            (self.pending.len(), None)
        }
    }
}

impl FusedIterator for PaymentSequencer<'_> {}
