use crate::Book;
use lem_core::models::{Metrics, Settlement};

mod adjusted;
pub use adjusted::Aup;

mod bargaining;
pub use bargaining::Nbs;

mod colm;
pub use colm::Colm;

mod cooperative;
pub use cooperative::{Cgt, Cgts};

mod iterative;
pub use iterative::Ipa;
pub(crate) use iterative::Tatonnement;

mod mediation;
pub use mediation::Mup;

mod newton;
pub use newton::Upnr;

mod single_price;
pub use single_price::{Apm, Cfrm, Mmp, Mpas, Wam};

mod uniform;
pub use uniform::Up;

mod vcg;
pub use vcg::Vcg;

/// Settle the whole tradable residual at one price
fn settle_at(book: &Book, price: f64, metrics: Metrics) -> Settlement {
    let transactions = book.fill_at(price);
    let metrics = metrics.with("last_price", price);
    Settlement {
        transactions,
        metrics,
    }
}
