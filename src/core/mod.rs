// Domain-layer modules and shared errors/models
pub mod scoring {
    pub use crate::scoring::*;
}

pub mod market_strategy {
    pub use crate::market_strategy::*;
}

pub mod copywriting {
    pub use crate::copywriting::*;
}

pub mod session {
    pub use crate::session::*;
}

pub mod dispatcher {
    pub use crate::dispatcher::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
