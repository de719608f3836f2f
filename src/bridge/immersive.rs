//! Fullscreen/immersive presentation hooks

use crate::utils::error::Result;
use log::info;

/// Host display mode switch around a player session
pub trait ImmersiveDisplay: Send {
    /// Hide system bars and go fullscreen
    fn enter_immersive(&mut self) -> Result<()>;

    /// Restore the normal display mode
    fn exit_immersive(&mut self) -> Result<()>;
}

/// Display without system bars to hide; only logs the transitions
#[derive(Debug, Default)]
pub struct LoggingDisplay {
    immersive: bool,
}

impl LoggingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_immersive(&self) -> bool {
        self.immersive
    }
}

impl ImmersiveDisplay for LoggingDisplay {
    fn enter_immersive(&mut self) -> Result<()> {
        self.immersive = true;
        info!("Entered immersive mode");
        Ok(())
    }

    fn exit_immersive(&mut self) -> Result<()> {
        self.immersive = false;
        info!("Left immersive mode");
        Ok(())
    }
}
