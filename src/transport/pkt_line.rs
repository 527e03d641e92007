//! Packet transport over a byte-stream duplex.
//!
//! Reads and writes single packets and flush-terminated packet lists. The
//! transport knows nothing about requests; one read consumes exactly one
//! packet and one write emits exactly one packet.
//!
//! # Example
//!
//! ```ignore
//! use lfs_filter::transport::PacketTransport;
//!
//! let mut transport = PacketTransport::new(tokio::io::stdin(), tokio::io::stdout());
//! let welcome = transport.read_packet_text().await?;
//! transport.write_packet_list(&["git-filter-server", "version=2"]).await?;
//! ```

use bytes::Bytes;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};

use crate::error::{FilterError, Result};
use crate::protocol::{LengthHeader, Packet, FLUSH_PACKET, LENGTH_HEADER_SIZE, MAX_PACKET_LENGTH};

/// Buffered packet reader/writer pair.
///
/// Output is buffered until a flush packet is written; every protocol
/// message group ends with one, so the host always sees complete groups.
pub struct PacketTransport<R, W> {
    reader: BufReader<R>,
    writer: BufWriter<W>,
}

impl<R, W> PacketTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wrap an input reader and output writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::with_capacity(MAX_PACKET_LENGTH + LENGTH_HEADER_SIZE, reader),
            writer: BufWriter::with_capacity(MAX_PACKET_LENGTH + LENGTH_HEADER_SIZE, writer),
        }
    }

    /// Get a reference to the underlying writer.
    ///
    /// Bytes not yet terminated by a flush packet are not visible here.
    pub fn get_writer(&self) -> &W {
        self.writer.get_ref()
    }

    /// Unwrap into the underlying reader and writer.
    ///
    /// Buffered input that was read ahead is discarded, as is output not
    /// yet terminated by a flush packet.
    pub fn into_inner(self) -> (R, W) {
        (self.reader.into_inner(), self.writer.into_inner())
    }

    /// Read one packet, or `None` on end of stream at a packet boundary.
    pub async fn try_read_packet(&mut self) -> Result<Option<Packet>> {
        if self.reader.fill_buf().await?.is_empty() {
            return Ok(None);
        }

        let mut header = [0u8; LENGTH_HEADER_SIZE];
        self.reader
            .read_exact(&mut header)
            .await
            .map_err(|e| truncated(e, "length header"))?;

        match LengthHeader::decode(&header)? {
            LengthHeader::Flush => Ok(Some(Packet::Flush)),
            LengthHeader::Data(len) => {
                let mut payload = vec![0u8; len];
                self.reader
                    .read_exact(&mut payload)
                    .await
                    .map_err(|e| truncated(e, "payload"))?;
                Ok(Some(Packet::Data(Bytes::from(payload))))
            }
        }
    }

    /// Read one packet; end of stream is a protocol error.
    pub async fn read_packet(&mut self) -> Result<Packet> {
        self.try_read_packet()
            .await?
            .ok_or_else(|| FilterError::Protocol("Unexpected end of stream".to_string()))
    }

    /// Read one packet as text, trailing newline removed.
    ///
    /// A flush reads as the empty string.
    pub async fn read_packet_text(&mut self) -> Result<String> {
        Ok(self.read_packet().await?.text())
    }

    /// Read text packets up to the next flush.
    ///
    /// Returns `None` if the stream ends before the first packet of the
    /// list. Ending anywhere else inside the list is a protocol error.
    pub async fn try_read_packet_list(&mut self) -> Result<Option<Vec<String>>> {
        let mut lines = Vec::new();
        loop {
            match self.try_read_packet().await? {
                None if lines.is_empty() => return Ok(None),
                None => {
                    return Err(FilterError::Protocol(
                        "Unexpected end of stream inside packet list".to_string(),
                    ))
                }
                Some(Packet::Flush) => return Ok(Some(lines)),
                Some(packet) => lines.push(packet.text()),
            }
        }
    }

    /// Read text packets up to the next flush; end of stream is an error.
    pub async fn read_packet_list(&mut self) -> Result<Vec<String>> {
        self.try_read_packet_list()
            .await?
            .ok_or_else(|| FilterError::Protocol("Unexpected end of stream".to_string()))
    }

    /// Write one data packet.
    ///
    /// Fails without writing anything if `payload` does not fit in a
    /// single packet; callers split large payloads themselves.
    pub async fn write_packet(&mut self, payload: &[u8]) -> Result<()> {
        let header = LengthHeader::Data(payload.len()).encode()?;
        self.writer.write_all(&header).await?;
        self.writer.write_all(payload).await?;
        Ok(())
    }

    /// Write one text packet (`text` plus newline).
    pub async fn write_packet_text(&mut self, text: &str) -> Result<()> {
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        self.write_packet(line.as_bytes()).await
    }

    /// Write each line as a text packet, then a flush.
    pub async fn write_packet_list<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<()> {
        for line in lines {
            self.write_packet_text(line.as_ref()).await?;
        }
        self.write_flush().await
    }

    /// Write a flush packet and push buffered output to the host.
    pub async fn write_flush(&mut self) -> Result<()> {
        self.writer.write_all(FLUSH_PACKET).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Map a short read to a framing error; keep other I/O errors as I/O.
fn truncated(err: std::io::Error, part: &str) -> FilterError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        FilterError::Protocol(format!("Truncated packet: stream ended inside {}", part))
    } else {
        FilterError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{build_packet, build_packet_list};

    fn transport(input: &[u8]) -> PacketTransport<&[u8], Vec<u8>> {
        PacketTransport::new(input, Vec::new())
    }

    #[tokio::test]
    async fn test_read_data_and_flush() {
        let mut input = build_packet(b"hello").unwrap();
        input.extend_from_slice(b"0000");
        let mut t = transport(&input);

        let packet = t.read_packet().await.unwrap();
        assert_eq!(packet.payload(), b"hello");
        assert!(t.read_packet().await.unwrap().is_flush());
        assert!(t.try_read_packet().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_truncated_payload() {
        let mut t = transport(b"000ahel");
        let err = t.read_packet().await.unwrap_err();
        assert!(matches!(err, FilterError::Protocol(_)));
        assert!(err.to_string().contains("Truncated"));
    }

    #[tokio::test]
    async fn test_read_truncated_header() {
        let mut t = transport(b"00");
        let err = t.read_packet().await.unwrap_err();
        assert!(err.to_string().contains("length header"));
    }

    #[tokio::test]
    async fn test_read_malformed_header() {
        let mut t = transport(b"xyz!data");
        assert!(matches!(
            t.read_packet().await,
            Err(FilterError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_read_packet_at_eof_is_error() {
        let mut t = transport(b"");
        assert!(t.read_packet().await.is_err());
    }

    #[tokio::test]
    async fn test_read_packet_text() {
        let input = build_packet(b"git-filter-client\n").unwrap();
        let mut t = transport(&input);
        assert_eq!(t.read_packet_text().await.unwrap(), "git-filter-client");
    }

    #[tokio::test]
    async fn test_read_packet_list() {
        let input = build_packet_list(&["version=2", "version=3"]).unwrap();
        let mut t = transport(&input);
        assert_eq!(
            t.read_packet_list().await.unwrap(),
            vec!["version=2".to_string(), "version=3".to_string()]
        );
    }

    #[tokio::test]
    async fn test_read_packet_list_leading_flush_is_empty() {
        let mut input = b"0000".to_vec();
        input.extend(build_packet_list(&["ignored"]).unwrap());
        let mut t = transport(&input);

        assert!(t.read_packet_list().await.unwrap().is_empty());
        assert_eq!(t.read_packet_list().await.unwrap(), vec!["ignored"]);
    }

    #[tokio::test]
    async fn test_try_read_packet_list_eof() {
        let mut t = transport(b"");
        assert!(t.try_read_packet_list().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_try_read_packet_list_eof_inside_list() {
        let input = build_packet(b"command=clean\n").unwrap();
        let mut t = transport(&input);
        assert!(t.try_read_packet_list().await.is_err());
    }

    #[tokio::test]
    async fn test_write_packet_list() {
        let mut t = transport(b"");
        t.write_packet_list(&["git-filter-server", "version=2"])
            .await
            .unwrap();

        let expected = build_packet_list(&["git-filter-server", "version=2"]).unwrap();
        assert_eq!(t.get_writer(), &expected);
    }

    #[tokio::test]
    async fn test_write_packet_oversized_writes_nothing() {
        let mut t = transport(b"");
        let payload = vec![0u8; MAX_PACKET_LENGTH + 1];
        assert!(t.write_packet(&payload).await.is_err());
        t.write_flush().await.unwrap();
        assert_eq!(t.get_writer(), b"0000");
    }

    #[tokio::test]
    async fn test_output_buffered_until_flush() {
        let mut t = transport(b"");
        t.write_packet(b"abc").await.unwrap();
        assert!(t.get_writer().is_empty());

        t.write_flush().await.unwrap();
        assert_eq!(t.get_writer(), b"0007abc0000");
    }
}
