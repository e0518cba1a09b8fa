use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::controller::{Command, Controller, Effect, Origin};
use crate::coordinator::{Delivery, RequestCoordinator, Resolved, Submission, TrajectoryBackend};
use crate::dashboard::{DashboardView, UpdateStatus};
use crate::render::{MapSurface, RenderSink};

/// Runtime services the session needs from its environment.
pub trait Host {
    fn spawn(&self, task: Pin<Box<dyn Future<Output = ()>>>);
    /// Arm the single tick timer, replacing any armed one.
    fn schedule_tick(&self, delay_ms: u32, fire: Box<dyn FnOnce()>);
    fn cancel_tick(&self);
    fn now_ms(&self) -> f64;
    fn state_changed(&self, view: DashboardView);
}

struct Inner<B, M, H> {
    controller: RefCell<Controller>,
    coordinator: RequestCoordinator<B>,
    sink: RefCell<RenderSink<M>>,
    status: RefCell<UpdateStatus>,
    host: H,
}

/// Wires the controller, the request coordinator and the render sink together and
/// carries out the controller's effects.
pub struct Session<B, M, H> {
    inner: Rc<Inner<B, M, H>>,
}

impl<B, M, H> Clone for Session<B, M, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B, M, H> Session<B, M, H>
where
    B: TrajectoryBackend + 'static,
    M: MapSurface + 'static,
    H: Host + 'static,
{
    pub fn new(controller: Controller, backend: B, map: M, host: H) -> Self {
        Self {
            inner: Rc::new(Inner {
                controller: RefCell::new(controller),
                coordinator: RequestCoordinator::new(backend),
                sink: RefCell::new(RenderSink::new(map)),
                status: RefCell::new(UpdateStatus::Idle),
                host,
            }),
        }
    }

    pub fn dispatch(&self, command: Command) {
        let now_ms = self.inner.host.now_ms();
        let effects = self.inner.controller.borrow_mut().dispatch(command, now_ms);
        self.run(effects);
        self.publish();
    }

    pub fn view(&self) -> DashboardView {
        let controller = self.inner.controller.borrow();
        let sink = self.inner.sink.borrow();
        let status = self.inner.status.borrow();
        DashboardView::build(&controller, &status, sink.table(), sink.drawn_paths())
    }

    pub fn publish(&self) {
        self.inner.host.state_changed(self.view());
    }

    pub fn status(&self) -> UpdateStatus {
        self.inner.status.borrow().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.coordinator.in_flight()
    }

    pub fn with_map<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(self.inner.sink.borrow().map())
    }

    fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Submit { request, origin } => self.submit(request, origin),
                Effect::Invalidate => {
                    self.inner.coordinator.invalidate();
                    self.inner.sink.borrow_mut().clear();
                    *self.inner.status.borrow_mut() = UpdateStatus::Idle;
                }
                Effect::ScheduleTick(delay_ms) => {
                    let weak = Rc::downgrade(&self.inner);
                    self.inner.host.schedule_tick(
                        delay_ms,
                        Box::new(move || {
                            if let Some(inner) = weak.upgrade() {
                                Session { inner }.dispatch(Command::Tick);
                            }
                        }),
                    );
                }
                Effect::CancelTick => self.inner.host.cancel_tick(),
                Effect::ErrorsPanel(on) => {
                    if !on {
                        self.inner.sink.borrow_mut().hide_table();
                    }
                }
            }
        }
    }

    fn submit(&self, submission: Submission, origin: Origin) {
        let ticket = match self.inner.coordinator.issue(submission) {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::debug!(error = %e, "submission rejected");
                if origin == Origin::Tick {
                    self.tick_settled();
                }
                return;
            }
        };
        *self.inner.status.borrow_mut() = UpdateStatus::Pending;

        let weak = Rc::downgrade(&self.inner);
        self.inner.host.spawn(Box::pin(async move {
            let resolved = ticket.resolve().await;
            if let Some(inner) = weak.upgrade() {
                Session { inner }.settle(resolved, origin);
            }
        }));
    }

    fn settle(&self, resolved: Resolved, origin: Origin) {
        match self.inner.coordinator.settle(resolved) {
            Ok(Delivery::Render(job)) => {
                let show_errors = self.inner.controller.borrow().show_errors();
                self.inner.sink.borrow_mut().apply(&job, show_errors);
                *self.inner.status.borrow_mut() = UpdateStatus::Updated { seq: job.seq };
            }
            Ok(Delivery::Superseded { .. }) => {}
            Err(e) => {
                *self.inner.status.borrow_mut() = UpdateStatus::Failed {
                    message: e.to_string(),
                };
            }
        }
        if origin == Origin::Tick {
            self.tick_settled();
        }
        self.publish();
    }

    fn tick_settled(&self) {
        let effects = self.inner.controller.borrow_mut().tick_settled();
        self.run(effects);
    }
}
