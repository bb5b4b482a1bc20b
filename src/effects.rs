use tokio::sync::mpsc;

/// Commands understood by the celebration stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCommand {
    /// Keep the background particle field running
    AmbientParticles,
    /// Confetti shown when the invitation appears
    InvitationBurst,
    /// Bigger burst requested by the guest
    CelebrationBurst,
    /// Stop any confetti still scheduled
    ClearCelebration,
}

/// Decorative effects. Calls are fire-and-forget and must never fail.
pub trait Effects: Send {
    fn trigger_ambient_particles(&self);

    /// Invoked when the invitation is revealed
    fn trigger_invitation_burst(&self);

    /// Invoked when the guest asks for a celebration
    fn trigger_celebration_burst(&self);

    fn clear_celebration(&self);
}

/// Forwards effect requests to whoever renders them.
#[derive(Debug, Clone)]
pub struct ChannelEffects {
    tx: mpsc::UnboundedSender<EffectCommand>,
}

impl ChannelEffects {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EffectCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, command: EffectCommand) {
        // A closed stage just means nobody is watching
        let _ = self.tx.send(command);
    }
}

impl Effects for ChannelEffects {
    fn trigger_ambient_particles(&self) {
        self.send(EffectCommand::AmbientParticles);
    }

    fn trigger_invitation_burst(&self) {
        self.send(EffectCommand::InvitationBurst);
    }

    fn trigger_celebration_burst(&self) {
        self.send(EffectCommand::CelebrationBurst);
    }

    fn clear_celebration(&self) {
        self.send(EffectCommand::ClearCelebration);
    }
}

/// Effects that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEffects;

impl Effects for NoEffects {
    fn trigger_ambient_particles(&self) {}
    fn trigger_invitation_burst(&self) {}
    fn trigger_celebration_burst(&self) {}
    fn clear_celebration(&self) {}
}
