use cricket_darts::{MatchSession, Multiplier, Target};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

/// One thrown dart
#[derive(Debug, Clone, Copy)]
pub enum Dart {
    Hit(Target, Multiplier),
    Miss,
}

impl Dart {
    pub fn triple(target: Target) -> Self {
        Dart::Hit(target, Multiplier::Triple)
    }

    pub fn single(target: Target) -> Self {
        Dart::Hit(target, Multiplier::Single)
    }
}

impl TestSetup {
    /// Throw one dart through the match service and adopt the committed session
    pub async fn throw(&self, session: &MatchSession, dart: Dart) -> MatchSession {
        let transition = match dart {
            Dart::Hit(target, multiplier) => self
                .state
                .matches
                .record_hit(session, target, multiplier)
                .await
                .unwrap(),
            Dart::Miss => self.state.matches.record_miss(session).await.unwrap(),
        };
        transition.session
    }

    /// Throw a sequence of darts in order
    pub async fn throw_all(&self, session: MatchSession, darts: &[Dart]) -> MatchSession {
        let mut session = session;
        for dart in darts {
            session = self.throw(&session, *dart).await;
        }
        session
    }

    /// Plays a two-player match that the first seat wins without scoring a point
    pub async fn play_shutout(&self, session: MatchSession) -> MatchSession {
        use Target::*;
        let miss_turn = [Dart::Miss, Dart::Miss, Dart::Miss];

        let session = self
            .throw_all(
                session,
                &[
                    Dart::triple(Twenty),
                    Dart::triple(Nineteen),
                    Dart::triple(Eighteen),
                ],
            )
            .await;
        let session = self.throw_all(session, &miss_turn).await;
        let session = self
            .throw_all(
                session,
                &[
                    Dart::triple(Seventeen),
                    Dart::triple(Sixteen),
                    Dart::triple(Fifteen),
                ],
            )
            .await;
        let session = self.throw_all(session, &miss_turn).await;
        self.throw_all(session, &[Dart::triple(Bull)]).await
    }
}
