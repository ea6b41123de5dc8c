use std::pin::Pin;

use futures::Stream;
use tonic::{Request, Response, Status};
use tracing::info;

use crate::echo::echo_server::Echo;
use crate::echo::{EchoReply, EchoRequest};

/// Answers every request with its own text.
#[derive(Debug, Clone, Default)]
pub struct EchoService;

impl EchoService {
    pub fn new() -> Self {
        Self
    }
}

fn require_text(request: &EchoRequest) -> Result<(), Status> {
    if request.text.is_empty() {
        return Err(Status::invalid_argument("text must not be empty"));
    }
    Ok(())
}

#[tonic::async_trait]
impl Echo for EchoService {
    async fn say(&self, request: Request<EchoRequest>) -> Result<Response<EchoReply>, Status> {
        let request = request.into_inner();
        require_text(&request)?;
        info!(text = %request.text, "say");
        Ok(Response::new(EchoReply { text: request.text }))
    }

    async fn shout(&self, request: Request<EchoRequest>) -> Result<Response<EchoReply>, Status> {
        let request = request.into_inner();
        require_text(&request)?;
        info!(text = %request.text, "shout");
        Ok(Response::new(EchoReply {
            text: request.text.to_uppercase(),
        }))
    }

    type SubscribeStream = Pin<Box<dyn Stream<Item = Result<EchoReply, Status>> + Send>>;

    async fn subscribe(
        &self,
        request: Request<EchoRequest>,
    ) -> Result<Response<Self::SubscribeStream>, Status> {
        let text = request.into_inner().text;
        let replies = (0..3).map(move |_| Ok(EchoReply { text: text.clone() }));
        Ok(Response::new(Box::pin(futures::stream::iter(replies))))
    }
}
