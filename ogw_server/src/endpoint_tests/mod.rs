mod checkout;
mod expiry;
mod helpers;
mod lookup;
mod mocks;
mod postal;
mod webhooks;
