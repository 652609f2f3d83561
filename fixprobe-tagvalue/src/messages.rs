/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Typed views over [`Message`].
//!
//! Each view checks its MsgType and required tags when it is constructed,
//! either from a [`MessageBuilder`] or through `TryFrom<Message>`, and fails
//! with [`BuildError::MissingRequiredField`] when a tag is absent. Coded and
//! numeric fields are parsed once at construction.

use fixprobe_core::{
    BuildError, CxlRejResponseTo, ExecType, Message, MsgType, OrdStatus, OrdType, Side, tags,
};
use rust_decimal::Decimal;
use std::marker::PhantomData;
use std::str::FromStr;

/// Default BeginString for messages built without an explicit version.
pub const DEFAULT_BEGIN_STRING: &str = "FIX.4.4";

/// A typed view over a generic [`Message`].
pub trait TypedMessage: Sized {
    /// MsgType (tag 35) of this view.
    const MSG_TYPE: &'static str;

    /// Tags that must be present for the view to be constructed.
    const REQUIRED_TAGS: &'static [u32];

    /// Parses typed fields out of a message whose required tags are present.
    ///
    /// # Errors
    /// Returns `BuildError` if a present field carries an unusable value.
    fn parse(msg: Message) -> Result<Self, BuildError>;

    /// Returns the underlying message.
    fn as_message(&self) -> &Message;

    /// Consumes the view and returns the underlying message.
    fn into_message(self) -> Message;

    /// Validates MsgType and required tags, then parses the view.
    ///
    /// # Errors
    /// Returns `BuildError::WrongMsgType` or `BuildError::MissingRequiredField`.
    fn from_message(msg: Message) -> Result<Self, BuildError> {
        if msg.get(tags::MSG_TYPE) != Some(Self::MSG_TYPE) {
            return Err(BuildError::WrongMsgType {
                expected: Self::MSG_TYPE,
                actual: msg.msg_type().as_str().to_string(),
            });
        }
        if let Some(&tag) = Self::REQUIRED_TAGS.iter().find(|&&t| !msg.contains(t)) {
            return Err(BuildError::MissingRequiredField {
                msg_type: Self::MSG_TYPE,
                tag,
            });
        }
        Self::parse(msg)
    }
}

fn required<T: FromStr>(msg: &Message, tag: u32) -> Result<T, BuildError> {
    msg.get_as(tag).map_err(|e| BuildError::InvalidFieldValue {
        tag,
        reason: e.to_string(),
    })
}

fn optional<T: FromStr>(msg: &Message, tag: u32) -> Result<Option<T>, BuildError> {
    msg.get_opt(tag).map_err(|e| BuildError::InvalidFieldValue {
        tag,
        reason: e.to_string(),
    })
}

/// Incremental builder for a typed message.
///
/// Setters write fields; [`MessageBuilder::build`] runs the view's validation.
#[derive(Debug, Clone)]
pub struct MessageBuilder<T> {
    msg: Message,
    _view: PhantomData<T>,
}

impl<T: TypedMessage> MessageBuilder<T> {
    /// Creates a builder with the default BeginString.
    #[must_use]
    pub fn new() -> Self {
        Self::with_begin_string(DEFAULT_BEGIN_STRING)
    }

    /// Creates a builder for the given BeginString.
    #[must_use]
    pub fn with_begin_string(begin_string: &str) -> Self {
        Self {
            msg: Message::new(begin_string, MsgType::from(T::MSG_TYPE)),
            _view: PhantomData,
        }
    }

    /// Sets an arbitrary field.
    #[must_use]
    pub fn field(mut self, tag: u32, value: impl Into<String>) -> Self {
        self.msg.set(tag, value);
        self
    }

    /// Sets ClOrdID (11).
    #[must_use]
    pub fn cl_ord_id(self, value: impl Into<String>) -> Self {
        self.field(tags::CL_ORD_ID, value)
    }

    /// Sets OrigClOrdID (41).
    #[must_use]
    pub fn orig_cl_ord_id(self, value: impl Into<String>) -> Self {
        self.field(tags::ORIG_CL_ORD_ID, value)
    }

    /// Sets OrderID (37).
    #[must_use]
    pub fn order_id(self, value: impl Into<String>) -> Self {
        self.field(tags::ORDER_ID, value)
    }

    /// Sets ExecID (17).
    #[must_use]
    pub fn exec_id(self, value: impl Into<String>) -> Self {
        self.field(tags::EXEC_ID, value)
    }

    /// Sets Symbol (55).
    #[must_use]
    pub fn symbol(self, value: impl Into<String>) -> Self {
        self.field(tags::SYMBOL, value)
    }

    /// Sets Side (54).
    #[must_use]
    pub fn side(self, side: Side) -> Self {
        self.field(tags::SIDE, side.to_string())
    }

    /// Sets OrdType (40).
    #[must_use]
    pub fn ord_type(self, ord_type: OrdType) -> Self {
        self.field(tags::ORD_TYPE, ord_type.to_string())
    }

    /// Sets OrderQty (38).
    #[must_use]
    pub fn order_qty(self, qty: Decimal) -> Self {
        self.field(tags::ORDER_QTY, qty.to_string())
    }

    /// Sets Price (44).
    #[must_use]
    pub fn price(self, price: Decimal) -> Self {
        self.field(tags::PRICE, price.to_string())
    }

    /// Sets ExecType (150).
    #[must_use]
    pub fn exec_type(self, exec_type: ExecType) -> Self {
        self.field(tags::EXEC_TYPE, exec_type.to_string())
    }

    /// Sets OrdStatus (39).
    #[must_use]
    pub fn ord_status(self, status: OrdStatus) -> Self {
        self.field(tags::ORD_STATUS, status.to_string())
    }

    /// Sets LeavesQty (151).
    #[must_use]
    pub fn leaves_qty(self, qty: Decimal) -> Self {
        self.field(tags::LEAVES_QTY, qty.to_string())
    }

    /// Sets CumQty (14).
    #[must_use]
    pub fn cum_qty(self, qty: Decimal) -> Self {
        self.field(tags::CUM_QTY, qty.to_string())
    }

    /// Sets AvgPx (6).
    #[must_use]
    pub fn avg_px(self, px: Decimal) -> Self {
        self.field(tags::AVG_PX, px.to_string())
    }

    /// Sets LastQty (32).
    #[must_use]
    pub fn last_qty(self, qty: Decimal) -> Self {
        self.field(tags::LAST_QTY, qty.to_string())
    }

    /// Sets LastPx (31).
    #[must_use]
    pub fn last_px(self, px: Decimal) -> Self {
        self.field(tags::LAST_PX, px.to_string())
    }

    /// Sets Text (58).
    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        self.field(tags::TEXT, text)
    }

    /// Sets HeartBtInt (108) in seconds.
    #[must_use]
    pub fn heart_bt_int(self, seconds: u64) -> Self {
        self.field(tags::HEART_BT_INT, seconds.to_string())
    }

    /// Sets TestReqID (112).
    #[must_use]
    pub fn test_req_id(self, id: impl Into<String>) -> Self {
        self.field(tags::TEST_REQ_ID, id)
    }

    /// Sets RefSeqNum (45).
    #[must_use]
    pub fn ref_seq_num(self, seq: u64) -> Self {
        self.field(tags::REF_SEQ_NUM, seq.to_string())
    }

    /// Sets RefMsgType (372).
    #[must_use]
    pub fn ref_msg_type(self, msg_type: impl Into<String>) -> Self {
        self.field(tags::REF_MSG_TYPE, msg_type)
    }

    /// Sets SessionRejectReason (373).
    #[must_use]
    pub fn session_reject_reason(self, reason: u32) -> Self {
        self.field(tags::SESSION_REJECT_REASON, reason.to_string())
    }

    /// Sets CxlRejResponseTo (434).
    #[must_use]
    pub fn cxl_rej_response_to(self, response_to: CxlRejResponseTo) -> Self {
        self.field(tags::CXL_REJ_RESPONSE_TO, response_to.to_string())
    }

    /// Validates and returns the typed message.
    ///
    /// # Errors
    /// Returns `BuildError::MissingRequiredField` if a required tag was never set.
    pub fn build(self) -> Result<T, BuildError> {
        T::from_message(self.msg)
    }
}

impl<T: TypedMessage> Default for MessageBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of a tag the view already checked on construction.
fn required_str(msg: &Message, tag: u32) -> &str {
    msg.get(tag).unwrap_or_default()
}

macro_rules! typed_view_common {
    ($($name:ident),+ $(,)?) => {
        $(
            impl $name {
                /// Starts a builder for this message type.
                #[must_use]
                pub fn builder() -> MessageBuilder<Self> {
                    MessageBuilder::new()
                }

                /// Returns the underlying message.
                #[must_use]
                pub fn message(&self) -> &Message {
                    &self.msg
                }
            }

            impl TryFrom<Message> for $name {
                type Error = BuildError;

                fn try_from(msg: Message) -> Result<Self, Self::Error> {
                    <Self as TypedMessage>::from_message(msg)
                }
            }

            impl From<$name> for Message {
                fn from(view: $name) -> Self {
                    view.msg
                }
            }
        )+
    };
}

/// NewOrderSingle (D).
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderSingle {
    msg: Message,
    side: Side,
    ord_type: OrdType,
    order_qty: Decimal,
    price: Option<Decimal>,
}

impl TypedMessage for NewOrderSingle {
    const MSG_TYPE: &'static str = "D";
    const REQUIRED_TAGS: &'static [u32] = &[
        tags::CL_ORD_ID,
        tags::SYMBOL,
        tags::SIDE,
        tags::ORDER_QTY,
        tags::ORD_TYPE,
    ];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        let ord_type: OrdType = required(&msg, tags::ORD_TYPE)?;
        if ord_type.requires_price() && !msg.contains(tags::PRICE) {
            return Err(BuildError::MissingRequiredField {
                msg_type: Self::MSG_TYPE,
                tag: tags::PRICE,
            });
        }
        Ok(Self {
            side: required(&msg, tags::SIDE)?,
            order_qty: required(&msg, tags::ORDER_QTY)?,
            price: optional(&msg, tags::PRICE)?,
            ord_type,
            msg,
        })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl NewOrderSingle {
    /// ClOrdID (11).
    #[must_use]
    pub fn cl_ord_id(&self) -> &str {
        required_str(&self.msg, tags::CL_ORD_ID)
    }

    /// Symbol (55).
    #[must_use]
    pub fn symbol(&self) -> &str {
        required_str(&self.msg, tags::SYMBOL)
    }

    /// Side (54).
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// OrdType (40).
    #[must_use]
    pub const fn ord_type(&self) -> OrdType {
        self.ord_type
    }

    /// OrderQty (38).
    #[must_use]
    pub const fn order_qty(&self) -> Decimal {
        self.order_qty
    }

    /// Price (44), present for priced order types.
    #[must_use]
    pub const fn price(&self) -> Option<Decimal> {
        self.price
    }
}

/// OrderCancelRequest (F).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCancelRequest {
    msg: Message,
    side: Side,
}

impl TypedMessage for OrderCancelRequest {
    const MSG_TYPE: &'static str = "F";
    const REQUIRED_TAGS: &'static [u32] = &[
        tags::ORIG_CL_ORD_ID,
        tags::CL_ORD_ID,
        tags::SYMBOL,
        tags::SIDE,
    ];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        Ok(Self {
            side: required(&msg, tags::SIDE)?,
            msg,
        })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl OrderCancelRequest {
    /// OrigClOrdID (41), the order being canceled.
    #[must_use]
    pub fn orig_cl_ord_id(&self) -> &str {
        required_str(&self.msg, tags::ORIG_CL_ORD_ID)
    }

    /// ClOrdID (11) of this request.
    #[must_use]
    pub fn cl_ord_id(&self) -> &str {
        required_str(&self.msg, tags::CL_ORD_ID)
    }

    /// Symbol (55).
    #[must_use]
    pub fn symbol(&self) -> &str {
        required_str(&self.msg, tags::SYMBOL)
    }

    /// Side (54).
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// OrderID (37), if the client supplied it.
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        self.msg.get(tags::ORDER_ID)
    }
}

/// OrderCancelReplaceRequest (G).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCancelReplaceRequest {
    msg: Message,
    side: Side,
    ord_type: OrdType,
    order_qty: Decimal,
    price: Option<Decimal>,
}

impl TypedMessage for OrderCancelReplaceRequest {
    const MSG_TYPE: &'static str = "G";
    const REQUIRED_TAGS: &'static [u32] = &[
        tags::ORIG_CL_ORD_ID,
        tags::CL_ORD_ID,
        tags::SYMBOL,
        tags::SIDE,
        tags::ORDER_QTY,
        tags::ORD_TYPE,
    ];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        Ok(Self {
            side: required(&msg, tags::SIDE)?,
            ord_type: required(&msg, tags::ORD_TYPE)?,
            order_qty: required(&msg, tags::ORDER_QTY)?,
            price: optional(&msg, tags::PRICE)?,
            msg,
        })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl OrderCancelReplaceRequest {
    /// OrigClOrdID (41), the order being replaced.
    #[must_use]
    pub fn orig_cl_ord_id(&self) -> &str {
        required_str(&self.msg, tags::ORIG_CL_ORD_ID)
    }

    /// ClOrdID (11) the order takes once replaced.
    #[must_use]
    pub fn cl_ord_id(&self) -> &str {
        required_str(&self.msg, tags::CL_ORD_ID)
    }

    /// Symbol (55).
    #[must_use]
    pub fn symbol(&self) -> &str {
        required_str(&self.msg, tags::SYMBOL)
    }

    /// Side (54).
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// OrdType (40).
    #[must_use]
    pub const fn ord_type(&self) -> OrdType {
        self.ord_type
    }

    /// New OrderQty (38).
    #[must_use]
    pub const fn order_qty(&self) -> Decimal {
        self.order_qty
    }

    /// New Price (44).
    #[must_use]
    pub const fn price(&self) -> Option<Decimal> {
        self.price
    }
}

/// ExecutionReport (8).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    msg: Message,
    exec_type: ExecType,
    ord_status: OrdStatus,
    side: Side,
    leaves_qty: Decimal,
    cum_qty: Decimal,
    avg_px: Decimal,
}

impl TypedMessage for ExecutionReport {
    const MSG_TYPE: &'static str = "8";
    const REQUIRED_TAGS: &'static [u32] = &[
        tags::ORDER_ID,
        tags::EXEC_ID,
        tags::CL_ORD_ID,
        tags::EXEC_TYPE,
        tags::ORD_STATUS,
        tags::SYMBOL,
        tags::SIDE,
        tags::LEAVES_QTY,
        tags::CUM_QTY,
        tags::AVG_PX,
    ];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        Ok(Self {
            exec_type: required(&msg, tags::EXEC_TYPE)?,
            ord_status: required(&msg, tags::ORD_STATUS)?,
            side: required(&msg, tags::SIDE)?,
            leaves_qty: required(&msg, tags::LEAVES_QTY)?,
            cum_qty: required(&msg, tags::CUM_QTY)?,
            avg_px: required(&msg, tags::AVG_PX)?,
            msg,
        })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl ExecutionReport {
    /// OrderID (37).
    #[must_use]
    pub fn order_id(&self) -> &str {
        required_str(&self.msg, tags::ORDER_ID)
    }

    /// ExecID (17).
    #[must_use]
    pub fn exec_id(&self) -> &str {
        required_str(&self.msg, tags::EXEC_ID)
    }

    /// ClOrdID (11).
    #[must_use]
    pub fn cl_ord_id(&self) -> &str {
        required_str(&self.msg, tags::CL_ORD_ID)
    }

    /// OrigClOrdID (41), set on cancel and replace reports.
    #[must_use]
    pub fn orig_cl_ord_id(&self) -> Option<&str> {
        self.msg.get(tags::ORIG_CL_ORD_ID)
    }

    /// Symbol (55).
    #[must_use]
    pub fn symbol(&self) -> &str {
        required_str(&self.msg, tags::SYMBOL)
    }

    /// ExecType (150).
    #[must_use]
    pub const fn exec_type(&self) -> ExecType {
        self.exec_type
    }

    /// OrdStatus (39).
    #[must_use]
    pub const fn ord_status(&self) -> OrdStatus {
        self.ord_status
    }

    /// Side (54).
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// LeavesQty (151).
    #[must_use]
    pub const fn leaves_qty(&self) -> Decimal {
        self.leaves_qty
    }

    /// CumQty (14).
    #[must_use]
    pub const fn cum_qty(&self) -> Decimal {
        self.cum_qty
    }

    /// AvgPx (6).
    #[must_use]
    pub const fn avg_px(&self) -> Decimal {
        self.avg_px
    }

    /// OrderQty (38), if echoed.
    #[must_use]
    pub fn order_qty(&self) -> Option<Decimal> {
        self.msg.get_opt(tags::ORDER_QTY).ok().flatten()
    }

    /// Price (44), if echoed.
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        self.msg.get_opt(tags::PRICE).ok().flatten()
    }

    /// LastQty (32), set on fills.
    #[must_use]
    pub fn last_qty(&self) -> Option<Decimal> {
        self.msg.get_opt(tags::LAST_QTY).ok().flatten()
    }

    /// LastPx (31), set on fills.
    #[must_use]
    pub fn last_px(&self) -> Option<Decimal> {
        self.msg.get_opt(tags::LAST_PX).ok().flatten()
    }

    /// Text (58).
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.msg.get(tags::TEXT)
    }
}

/// Logon (A).
#[derive(Debug, Clone, PartialEq)]
pub struct Logon {
    msg: Message,
    heart_bt_int: u64,
}

impl TypedMessage for Logon {
    const MSG_TYPE: &'static str = "A";
    const REQUIRED_TAGS: &'static [u32] = &[tags::ENCRYPT_METHOD, tags::HEART_BT_INT];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        Ok(Self {
            heart_bt_int: required(&msg, tags::HEART_BT_INT)?,
            msg,
        })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl Logon {
    /// Builder preset with EncryptMethod=0 and the given HeartBtInt.
    #[must_use]
    pub fn with_heartbeat(seconds: u64) -> MessageBuilder<Self> {
        Self::builder()
            .field(tags::ENCRYPT_METHOD, "0")
            .heart_bt_int(seconds)
    }

    /// HeartBtInt (108) in seconds.
    #[must_use]
    pub const fn heart_bt_int(&self) -> u64 {
        self.heart_bt_int
    }
}

/// Heartbeat (0).
#[derive(Debug, Clone, PartialEq)]
pub struct Heartbeat {
    msg: Message,
}

impl TypedMessage for Heartbeat {
    const MSG_TYPE: &'static str = "0";
    const REQUIRED_TAGS: &'static [u32] = &[];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        Ok(Self { msg })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl Heartbeat {
    /// TestReqID (112) when answering a TestRequest.
    #[must_use]
    pub fn test_req_id(&self) -> Option<&str> {
        self.msg.get(tags::TEST_REQ_ID)
    }
}

/// TestRequest (1).
#[derive(Debug, Clone, PartialEq)]
pub struct TestRequest {
    msg: Message,
}

impl TypedMessage for TestRequest {
    const MSG_TYPE: &'static str = "1";
    const REQUIRED_TAGS: &'static [u32] = &[tags::TEST_REQ_ID];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        Ok(Self { msg })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl TestRequest {
    /// TestReqID (112).
    #[must_use]
    pub fn test_req_id(&self) -> &str {
        required_str(&self.msg, tags::TEST_REQ_ID)
    }
}

/// Session-level Reject (3).
#[derive(Debug, Clone, PartialEq)]
pub struct Reject {
    msg: Message,
    ref_seq_num: u64,
}

impl TypedMessage for Reject {
    const MSG_TYPE: &'static str = "3";
    const REQUIRED_TAGS: &'static [u32] = &[tags::REF_SEQ_NUM];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        Ok(Self {
            ref_seq_num: required(&msg, tags::REF_SEQ_NUM)?,
            msg,
        })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl Reject {
    /// SessionRejectReason for a missing required tag.
    pub const REASON_REQUIRED_TAG_MISSING: u32 = 1;

    /// SessionRejectReason for a value of the wrong type or range.
    pub const REASON_VALUE_INCORRECT: u32 = 5;

    /// SessionRejectReason for an unsupported MsgType.
    pub const REASON_INVALID_MSG_TYPE: u32 = 11;

    /// RefSeqNum (45).
    #[must_use]
    pub const fn ref_seq_num(&self) -> u64 {
        self.ref_seq_num
    }

    /// RefMsgType (372).
    #[must_use]
    pub fn ref_msg_type(&self) -> Option<&str> {
        self.msg.get(tags::REF_MSG_TYPE)
    }

    /// SessionRejectReason (373).
    #[must_use]
    pub fn reason(&self) -> Option<u32> {
        self.msg
            .get_opt(tags::SESSION_REJECT_REASON)
            .ok()
            .flatten()
    }

    /// Text (58).
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.msg.get(tags::TEXT)
    }
}

/// Logout (5).
#[derive(Debug, Clone, PartialEq)]
pub struct Logout {
    msg: Message,
}

impl TypedMessage for Logout {
    const MSG_TYPE: &'static str = "5";
    const REQUIRED_TAGS: &'static [u32] = &[];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        Ok(Self { msg })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl Logout {
    /// Text (58).
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.msg.get(tags::TEXT)
    }
}

/// OrderCancelReject (9).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCancelReject {
    msg: Message,
    ord_status: OrdStatus,
    response_to: CxlRejResponseTo,
}

impl TypedMessage for OrderCancelReject {
    const MSG_TYPE: &'static str = "9";
    const REQUIRED_TAGS: &'static [u32] = &[
        tags::ORDER_ID,
        tags::CL_ORD_ID,
        tags::ORIG_CL_ORD_ID,
        tags::ORD_STATUS,
        tags::CXL_REJ_RESPONSE_TO,
    ];

    fn parse(msg: Message) -> Result<Self, BuildError> {
        Ok(Self {
            ord_status: required(&msg, tags::ORD_STATUS)?,
            response_to: required(&msg, tags::CXL_REJ_RESPONSE_TO)?,
            msg,
        })
    }

    fn as_message(&self) -> &Message {
        &self.msg
    }

    fn into_message(self) -> Message {
        self.msg
    }
}

impl OrderCancelReject {
    /// OrderID (37), `NONE` when the order is unknown.
    #[must_use]
    pub fn order_id(&self) -> &str {
        required_str(&self.msg, tags::ORDER_ID)
    }

    /// ClOrdID (11) of the rejected request.
    #[must_use]
    pub fn cl_ord_id(&self) -> &str {
        required_str(&self.msg, tags::CL_ORD_ID)
    }

    /// OrigClOrdID (41) of the order the request targeted.
    #[must_use]
    pub fn orig_cl_ord_id(&self) -> &str {
        required_str(&self.msg, tags::ORIG_CL_ORD_ID)
    }

    /// OrdStatus (39) of the targeted order.
    #[must_use]
    pub const fn ord_status(&self) -> OrdStatus {
        self.ord_status
    }

    /// Which request was rejected (434).
    #[must_use]
    pub const fn response_to(&self) -> CxlRejResponseTo {
        self.response_to
    }

    /// Text (58).
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.msg.get(tags::TEXT)
    }
}

typed_view_common!(
    NewOrderSingle,
    OrderCancelRequest,
    OrderCancelReplaceRequest,
    ExecutionReport,
    Logon,
    Heartbeat,
    TestRequest,
    Reject,
    Logout,
    OrderCancelReject,
);
