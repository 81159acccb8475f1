//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use reinhardt_location::{ComponentContext, MemoryRouter, RouteRecord};

/// A router with a user, a nested post route and a search page.
pub fn app_router() -> MemoryRouter {
	MemoryRouter::new()
		.named_route("home", "/")
		.named_route("search", "/search")
		.named_route("user", "/users/:id")
		.route(vec![
			RouteRecord::named("user-root", "/users/:user_id"),
			RouteRecord::named("user-post", "/users/:user_id/posts/:post_id"),
		])
}

/// Starts [`app_router`] at `href` and wraps it in a component context.
pub fn mounted_at(href: &str) -> (Rc<MemoryRouter>, ComponentContext) {
	let router = Rc::new(app_router().start_at(href).unwrap());
	let cx = ComponentContext::new(router.clone());
	(router, cx)
}

/// Collects the messages of every event emitted while installed.
#[derive(Clone, Default)]
pub struct LogCapture {
	pub logs: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
	pub fn messages(&self) -> Vec<String> {
		self.logs.lock().unwrap().clone()
	}
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		struct MessageVisitor {
			message: String,
		}

		impl tracing::field::Visit for MessageVisitor {
			fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
				if field.name() == "message" {
					self.message = format!("{:?}", value);
				}
			}
		}

		let mut visitor = MessageVisitor {
			message: String::new(),
		};
		event.record(&mut visitor);

		if *event.metadata().level() == tracing::Level::WARN {
			self.logs.lock().unwrap().push(visitor.message);
		}
	}
}
