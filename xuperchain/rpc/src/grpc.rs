//! Generated-shape gRPC client over [`crate::wire`] messages. Written by
//! hand in the layout `tonic-build` emits from a `.proto` service
//! definition, since no codegen step runs in this crate.

use tonic::codegen::*;

use crate::wire::*;

#[derive(Debug, Clone)]
pub struct XchainClient<T> {
    inner: tonic::client::Grpc<T>,
}

impl XchainClient<tonic::transport::Channel> {
    pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
    where
        D: TryInto<tonic::transport::Endpoint>,
        D::Error: Into<StdError>,
    {
        let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
        Ok(Self::new(conn))
    }
}

impl<T> XchainClient<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody>,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + Send,
{
    pub fn new(inner: T) -> Self {
        let inner = tonic::client::Grpc::new(inner);
        Self { inner }
    }

    async fn unary<Req, Resp>(
        &mut self,
        request: Req,
        path: &'static str,
    ) -> Result<Resp, tonic::Status>
    where
        Req: prost::Message + 'static,
        Resp: prost::Message + Default + 'static,
    {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::unknown(format!("service was not ready: {}", e.into()))
        })?;
        let codec = tonic::codec::ProstCodec::default();
        let path = http::uri::PathAndQuery::from_static(path);
        self.inner
            .unary(tonic::Request::new(request), path, codec)
            .await
            .map(|resp| resp.into_inner())
    }

    pub async fn get_balance(
        &mut self,
        req: GetBalanceRequest,
    ) -> Result<BalanceResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/GetBalance").await
    }

    pub async fn get_block(&mut self, req: GetBlockRequest) -> Result<BlockResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/GetBlock").await
    }

    pub async fn get_block_by_height(
        &mut self,
        req: GetBlockByHeightRequest,
    ) -> Result<BlockResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/GetBlockByHeight")
            .await
    }

    pub async fn get_block_chain_status(
        &mut self,
        req: ChainStatusRequest,
    ) -> Result<ChainStatusResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/GetBlockChainStatus")
            .await
    }

    pub async fn query_tx(&mut self, req: QueryTxRequest) -> Result<QueryTxResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/QueryTx").await
    }

    pub async fn query_acl(
        &mut self,
        req: QueryAclRequest,
    ) -> Result<QueryAclResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/QueryACL").await
    }

    pub async fn pre_exec(
        &mut self,
        req: PreExecRequest,
    ) -> Result<PreExecResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/PreExec").await
    }

    pub async fn pre_exec_with_select_utxo(
        &mut self,
        req: PreExecWithSelectUtxoRequest,
    ) -> Result<PreExecWithSelectUtxoResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/PreExecWithSelectUTXO")
            .await
    }

    pub async fn select_utxo(
        &mut self,
        req: SelectUtxoRequest,
    ) -> Result<UtxoResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/SelectUTXO").await
    }

    pub async fn select_utxo_by_size(
        &mut self,
        req: SelectUtxoBySizeRequest,
    ) -> Result<UtxoResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/SelectUTXOBySize")
            .await
    }

    pub async fn post_tx(&mut self, req: PostTxRequest) -> Result<PostTxResponse, tonic::Status> {
        self.unary(req, "/xuperchain.pb.Xchain/PostTx").await
    }
}
