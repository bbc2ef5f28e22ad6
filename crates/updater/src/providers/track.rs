//! Faixa atual do MPD, pelo protocolo texto sobre TCP.

use super::{Provider, ProviderError, Reading};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

const IO_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TrackProvider {
    endpoint: String,
}

impl TrackProvider {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }

    fn read(&self) -> Result<String, ProviderError> {
        let addr = self
            .endpoint
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| ProviderError::Parse(format!("endpoint inválido: {}", self.endpoint)))?;
        let stream = TcpStream::connect_timeout(&addr, IO_TIMEOUT)?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;

        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(stream);

        let mut greeting = String::new();
        reader.read_line(&mut greeting)?;
        if !greeting.starts_with("OK MPD") {
            return Err(ProviderError::Parse(greeting.trim().into()));
        }

        let status = query(&mut reader, &mut writer, "status")?;
        let song = query(&mut reader, &mut writer, "currentsong")?;
        let _ = writer.write_all(b"close\n");

        Ok(format_track(&status, &song))
    }
}

impl Provider for TrackProvider {
    fn poll(&mut self) -> Reading {
        // MPD fora do ar é o caso comum: omite a chave
        Reading::from_result(self.read(), "")
    }
}

/// Envia um comando e coleta os pares `chave: valor` até `OK`.
fn query<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    command: &str,
) -> Result<HashMap<String, String>, ProviderError> {
    writer.write_all(format!("{command}\n").as_bytes())?;
    writer.flush()?;
    parse_response(reader)
}

fn parse_response<R: BufRead>(reader: &mut R) -> Result<HashMap<String, String>, ProviderError> {
    let mut fields = HashMap::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(ProviderError::Parse("conexão fechada pelo MPD".into()));
        }
        let line = line.trim_end();
        if line == "OK" {
            return Ok(fields);
        }
        if line.starts_with("ACK") {
            return Err(ProviderError::Parse(line.into()));
        }
        if let Some((key, value)) = line.split_once(": ") {
            fields.insert(key.to_string(), value.to_string());
        }
    }
}

/// `Artist - Title`, com `⏸ ` quando pausado; vazio quando parado.
fn format_track(status: &HashMap<String, String>, song: &HashMap<String, String>) -> String {
    let state = status.get("state").map(String::as_str).unwrap_or("stop");
    if state == "stop" {
        return String::new();
    }

    let title = song
        .get("Title")
        .or_else(|| song.get("file"))
        .map(String::as_str)
        .unwrap_or_default();
    let text = match song.get("Artist") {
        Some(artist) => format!("{artist} - {title}"),
        None => title.to_string(),
    };

    if state == "pause" {
        format!("⏸ {text}")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::TcpListener;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_until_ok() {
        let mut input = Cursor::new("Artist: Low\nTitle: Lullaby\nOK\nleftover\n");
        let parsed = parse_response(&mut input).unwrap();
        assert_eq!(parsed.get("Artist").unwrap(), "Low");
        assert_eq!(parsed.get("Title").unwrap(), "Lullaby");
    }

    #[test]
    fn ack_is_an_error() {
        let mut input = Cursor::new("ACK [5@0] {} unknown command\n");
        assert!(matches!(
            parse_response(&mut input),
            Err(ProviderError::Parse(_))
        ));
    }

    #[test]
    fn formats_by_state() {
        let song = fields(&[("Artist", "Low"), ("Title", "Lullaby")]);
        assert_eq!(format_track(&fields(&[("state", "play")]), &song), "Low - Lullaby");
        assert_eq!(format_track(&fields(&[("state", "pause")]), &song), "⏸ Low - Lullaby");
        assert_eq!(format_track(&fields(&[("state", "stop")]), &song), "");
    }

    #[test]
    fn falls_back_to_file_name() {
        let song = fields(&[("file", "music/untitled.flac")]);
        assert_eq!(
            format_track(&fields(&[("state", "play")]), &song),
            "music/untitled.flac"
        );
    }

    #[test]
    fn talks_to_a_fake_mpd() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            writer.write_all(b"OK MPD 0.23.5\n").unwrap();
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, "status\n");
            writer.write_all(b"volume: 80\nstate: play\nOK\n").unwrap();
            line.clear();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, "currentsong\n");
            writer
                .write_all(b"file: a.flac\nArtist: Low\nTitle: Lullaby\nOK\n")
                .unwrap();
        });

        let mut provider = TrackProvider::new(endpoint);
        let reading = provider.poll();
        server.join().unwrap();
        assert!(matches!(reading, Reading::Fresh(_)));
        assert_eq!(reading.text(), "Low - Lullaby");
    }

    #[test]
    fn unreachable_mpd_is_omitted() {
        // Porta reservada sem listener
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        drop(listener);

        let reading = TrackProvider::new(endpoint).poll();
        assert!(matches!(reading, Reading::Degraded { .. }));
        assert_eq!(reading.text(), "");
    }
}
